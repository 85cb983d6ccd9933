use loanlab_core::{LabError, LabResult};
use loanlab_models::{
    apply_params, BaggingClassifier, Classifier, GradientBoostingClassifier, LogisticRegression,
    ParamSet, RandomForestClassifier, SamplingMode,
};

/// The classifiers every comparison experiment starts from.
pub fn default_roster(seed: u64) -> Vec<Box<dyn Classifier>> {
    let mut models: Vec<Box<dyn Classifier>> = vec![
        Box::new(LogisticRegression::new()),
        Box::new(RandomForestClassifier::new()),
        Box::new(GradientBoostingClassifier::new()),
        Box::new(BaggingClassifier::new(SamplingMode::Bootstrap)),
        Box::new(BaggingClassifier::new(SamplingMode::BalancedUnder)),
        Box::new(BaggingClassifier::new(SamplingMode::BalancedOver)),
    ];
    for model in &mut models {
        model.set_seed(seed);
    }
    models
}

/// Expand base models with configured variants: the bases keep their
/// defaults, and every parameter set adds one reconfigured clone of the
/// named base.
pub fn create_models(
    bases: &[Box<dyn Classifier>],
    param_sets: &[(String, ParamSet)],
    seed: u64,
) -> LabResult<Vec<Box<dyn Classifier>>> {
    let mut models: Vec<Box<dyn Classifier>> = Vec::with_capacity(bases.len() + param_sets.len());
    for base in bases {
        let mut model = base.clone_unfitted();
        model.set_seed(seed);
        models.push(model);
    }
    for (base_name, params) in param_sets {
        let base = bases
            .iter()
            .find(|b| &b.name() == base_name)
            .ok_or_else(|| {
                LabError::InvalidOperation(format!("no base model named {base_name}"))
            })?;
        let mut model = base.clone_unfitted();
        apply_params(model.as_mut(), params)?;
        model.set_seed(seed);
        models.push(model);
    }
    Ok(models)
}

/// Display name plus the rendered subset of hyperparameters shown in
/// result tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub params: String,
}

pub fn prepare_models_info(
    models: &[Box<dyn Classifier>],
    params_to_save: &[String],
) -> Vec<ModelInfo> {
    models
        .iter()
        .map(|model| {
            let params = params_to_save
                .iter()
                .filter_map(|name| {
                    model
                        .get_param(name)
                        .map(|value| format!("{name}={value}"))
                })
                .collect::<Vec<_>>()
                .join(", ");
            ModelInfo {
                name: model.name(),
                params,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_models::ParamValue;

    #[test]
    fn test_default_roster_names() {
        let names: Vec<String> = default_roster(42).iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec![
                "LogisticRegression",
                "RandomForestClassifier",
                "GradientBoostingClassifier",
                "BaggingClassifier",
                "BalancedBagging_UnderSampling",
                "BalancedBagging_OverSampling",
            ]
        );
    }

    #[test]
    fn test_create_models_adds_one_clone_per_param_set() {
        let bases = default_roster(42);
        let param_sets = vec![
            (
                "RandomForestClassifier".to_string(),
                vec![("n_estimators".to_string(), ParamValue::Int(50))],
            ),
            (
                "RandomForestClassifier".to_string(),
                vec![("n_estimators".to_string(), ParamValue::Int(200))],
            ),
        ];
        let models = create_models(&bases, &param_sets, 42).unwrap();
        assert_eq!(models.len(), bases.len() + param_sets.len());

        // The bases keep their defaults, the clones carry their set
        let default_n = bases[1].get_param("n_estimators").unwrap();
        assert_eq!(models[1].get_param("n_estimators").unwrap(), default_n);
        assert_eq!(
            models[bases.len()].get_param("n_estimators").unwrap(),
            ParamValue::Int(50)
        );
        assert_eq!(
            models[bases.len() + 1].get_param("n_estimators").unwrap(),
            ParamValue::Int(200)
        );
    }

    #[test]
    fn test_create_models_rejects_unknown_base() {
        let bases = default_roster(42);
        let param_sets = vec![("NoSuchModel".to_string(), vec![])];
        assert!(create_models(&bases, &param_sets, 42).is_err());
    }

    #[test]
    fn test_models_info_renders_known_params_only() {
        let bases = default_roster(42);
        let params_to_save = vec!["n_estimators".to_string(), "max_features".to_string()];
        let info = prepare_models_info(&bases, &params_to_save);
        assert_eq!(info.len(), bases.len());
        // Logistic regression has none of the tree knobs
        assert_eq!(info[0].name, "LogisticRegression");
        assert!(info[0].params.is_empty());
        // The forest shows both
        assert!(info[1].params.contains("n_estimators="));
        assert!(info[1].params.contains("max_features="));
    }
}
