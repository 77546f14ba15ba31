use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductKind {
    RollerBlind,
}

impl std::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "roller-blind" | "rollerblind" => Ok(Self::RollerBlind),
            other => Err(format!("unsupported product kind `{other}` (expected roller-blind)")),
        }
    }
}

/// A measured dimension of a line item. Doubles as the keypad input mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Width,
    Height,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub min: u32,
    pub max: u32,
    pub display_name: String,
}

impl ValidationRule {
    pub fn new(min: u32, max: u32, display_name: impl Into<String>) -> Self {
        Self { min, max, display_name: display_name.into() }
    }

    pub fn accepts(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn violation_message(&self) -> String {
        format!("{} must be between {} and {}.", self.display_name, self.min, self.max)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub width: ValidationRule,
    pub height: ValidationRule,
}

impl ValidationRules {
    pub fn rule_for(&self, dimension: Dimension) -> &ValidationRule {
        match dimension {
            Dimension::Width => &self.width,
            Dimension::Height => &self.height,
        }
    }
}
