use serde::{Deserialize, Serialize};

/// Compound identifies a tire mixture. Unset marks a car whose starting tires
/// have not been chosen yet (agent-run teams pick them before the start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Unset,
}

impl Compound {
    /// base_speed returns the nominal speed (units/s) on a fresh set.
    pub fn base_speed(self) -> f64 {
        match self {
            Compound::Soft => 30.5,
            Compound::Medium => 29.0,
            Compound::Hard => 28.0,
            Compound::Unset => 29.0, // neutral fallback
        }
    }

    /// base_degradation returns the condition loss in %/s of racing.
    pub fn base_degradation(self) -> f64 {
        match self {
            Compound::Soft => 0.18,
            Compound::Medium => 0.09,
            Compound::Hard => 0.06,
            Compound::Unset => 0.09, // neutral fallback
        }
    }

    /// letter is the single-character label shown on scoreboards.
    pub fn letter(self) -> &'static str {
        match self {
            Compound::Soft => "S",
            Compound::Medium => "M",
            Compound::Hard => "H",
            Compound::Unset => "?",
        }
    }

    /// parse matches a compound name case-insensitively; Unset is not
    /// addressable from the outside.
    pub fn parse(s: &str) -> Option<Compound> {
        match s.to_lowercase().as_str() {
            "soft" => Some(Compound::Soft),
            "medium" => Some(Compound::Medium),
            "hard" => Some(Compound::Hard),
            _ => None,
        }
    }
}

/// DrivingStyle is the pace instruction a driver currently follows. Push and
/// conserve trade speed against tire wear in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingStyle {
    Push,
    Normal,
    Conserve,
}

impl DrivingStyle {
    /// speed_modifier is added to the compound base speed (units/s).
    pub fn speed_modifier(self) -> f64 {
        match self {
            DrivingStyle::Push => 2.0,
            DrivingStyle::Normal => 0.0,
            DrivingStyle::Conserve => -1.2,
        }
    }

    /// wear_modifier is added to the compound degradation rate (%/s).
    pub fn wear_modifier(self) -> f64 {
        match self {
            DrivingStyle::Push => 0.12,
            DrivingStyle::Normal => 0.0,
            DrivingStyle::Conserve => -0.04,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrivingStyle::Push => "push",
            DrivingStyle::Normal => "normal",
            DrivingStyle::Conserve => "conserve",
        }
    }

    pub fn parse(s: &str) -> Option<DrivingStyle> {
        match s.to_lowercase().as_str() {
            "push" => Some(DrivingStyle::Push),
            "normal" => Some(DrivingStyle::Normal),
            "conserve" => Some(DrivingStyle::Conserve),
            _ => None,
        }
    }
}

/// Tireset is the set of tires currently fitted to a car. Condition runs from
/// 100 (fresh) down to 0 (fully worn); it never leaves that range.
#[derive(Debug, Clone)]
pub struct Tireset {
    pub compound: Compound,
    pub condition: f64,
}

impl Tireset {
    pub fn new(compound: Compound) -> Tireset {
        Tireset {
            compound,
            condition: 100.0,
        }
    }

    /// wear applies degradation for one timestep, keeping condition in [0, 100].
    pub fn wear(&mut self, wear_rate: f64, delta_s: f64) {
        self.condition = (self.condition - wear_rate * delta_s).max(0.0).min(100.0);
    }

    /// effective_speed derates a nominal speed with the tire condition. A fully
    /// worn set runs at half the nominal speed.
    pub fn effective_speed(&self, base_speed: f64) -> f64 {
        base_speed - base_speed * (100.0 - self.condition) / 200.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wear_stays_within_bounds() {
        let mut tires = Tireset::new(Compound::Soft);
        tires.wear(0.18, 10_000.0);
        assert_eq!(tires.condition, 0.0);

        let mut tires = Tireset::new(Compound::Hard);
        tires.wear(-1.0, 10.0); // net negative rate must not push past fresh
        assert_eq!(tires.condition, 100.0);
    }

    #[test]
    fn effective_speed_halves_at_zero_condition() {
        let mut tires = Tireset::new(Compound::Medium);
        assert_relative_eq!(tires.effective_speed(29.0), 29.0);
        tires.condition = 0.0;
        assert_relative_eq!(tires.effective_speed(29.0), 14.5);
        tires.condition = 50.0;
        assert_relative_eq!(tires.effective_speed(29.0), 29.0 - 29.0 * 0.25);
    }

    #[test]
    fn style_table_is_symmetrical_around_normal() {
        assert_eq!(DrivingStyle::Normal.speed_modifier(), 0.0);
        assert_eq!(DrivingStyle::Normal.wear_modifier(), 0.0);
        assert!(DrivingStyle::Push.speed_modifier() > 0.0);
        assert!(DrivingStyle::Conserve.speed_modifier() < 0.0);
        assert!(DrivingStyle::Push.wear_modifier() > 0.0);
        assert!(DrivingStyle::Conserve.wear_modifier() < 0.0);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Compound::parse("SOFT"), Some(Compound::Soft));
        assert_eq!(Compound::parse("Medium"), Some(Compound::Medium));
        assert_eq!(Compound::parse("wet"), None);
        assert_eq!(DrivingStyle::parse("PUSH"), Some(DrivingStyle::Push));
        assert_eq!(DrivingStyle::parse("flatout"), None);
    }
}
