use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registry row mapping a trading model to the collection holding its ticks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModelEntry {
    pub id: Uuid,
    pub model_name: String,
    pub ticks_ref: String,
}

impl ModelEntry {
    /// `"mean_reversion"` -> `"Mean Reversion"`.
    pub fn display_name(&self) -> String {
        self.model_name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ModelEntry {
        ModelEntry {
            id: Uuid::new_v4(),
            model_name: name.into(),
            ticks_ref: format!("{name}_ticks"),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(entry("momentum").display_name(), "Momentum");
        assert_eq!(entry("mean_reversion").display_name(), "Mean Reversion");
        assert_eq!(entry("").display_name(), "");
    }
}
