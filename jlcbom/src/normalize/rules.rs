//! Ordered footprint classification rules.

use std::sync::LazyLock;

use regex::Regex;

use super::{NormalizedPart, PartKind};

/// Packages at least this long are considered too specific to match on
const SHORT_PACKAGE_LEN: usize = 8;

/// When a rule applies
pub enum RulePredicate {
    Pattern(Regex),
    ShorterThan(usize),
}

impl RulePredicate {
    fn matches(&self, package: &str) -> bool {
        match self {
            RulePredicate::Pattern(re) => re.is_match(package),
            RulePredicate::ShorterThan(len) => package.chars().count() < *len,
        }
    }
}

/// One entry of the classification table
pub struct FootprintRule {
    pub name: &'static str,
    pub predicate: RulePredicate,
    transform: fn(&str, &str) -> NormalizedPart,
}

impl FootprintRule {
    pub fn matches(&self, package: &str) -> bool {
        self.predicate.matches(package)
    }

    /// Apply the rule to an already trimmed, upper-cased pair
    pub fn apply(&self, package: &str, value: &str) -> Option<NormalizedPart> {
        self.matches(package).then(|| (self.transform)(package, value))
    }
}

fn pattern(re: &str) -> RulePredicate {
    // Patterns are literals of this module
    RulePredicate::Pattern(Regex::new(re).expect("invalid footprint rule pattern"))
}

static RULES: LazyLock<Vec<FootprintRule>> = LazyLock::new(|| {
    vec![
        FootprintRule {
            name: "capacitor",
            predicate: pattern(r"^C\d{4,5}"),
            transform: |package, value| passive(package, value.to_string(), PartKind::Capacitor),
        },
        FootprintRule {
            name: "resistor",
            predicate: pattern(r"^R\d{4,5}"),
            transform: |package, value| passive(package, resistor_value(value), PartKind::Resistor),
        },
        FootprintRule {
            name: "inductor",
            predicate: pattern(r"^L\d{4,5}"),
            transform: |package, value| passive(package, value.to_string(), PartKind::Inductor),
        },
        FootprintRule {
            name: "sot",
            predicate: pattern(r"^SOT-?\d{2,3}(-\d)?$"),
            transform: |package, value| NormalizedPart {
                package: sot_package(package),
                value: value.to_string(),
                kind: None,
            },
        },
        FootprintRule {
            name: "diode",
            predicate: pattern(r"^(DO-?\d{3}[A-Z0-9-]*|SM[ABC])$"),
            transform: |package, value| NormalizedPart {
                package: package.to_string(),
                value: value.to_string(),
                kind: Some(PartKind::Diode),
            },
        },
        FootprintRule {
            name: "short",
            predicate: RulePredicate::ShorterThan(SHORT_PACKAGE_LEN),
            transform: |package, value| NormalizedPart {
                package: package.to_string(),
                value: value.to_string(),
                kind: None,
            },
        },
    ]
});

/// The classification table, in priority order
pub fn rules() -> &'static [FootprintRule] {
    &RULES
}

static SIZE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[CRL](\d{4,5})").expect("valid regex"));

/// Keep only the numeric size code: `C0805-HANDSOLDER` becomes `0805`
fn passive(package: &str, value: String, kind: PartKind) -> NormalizedPart {
    let size = SIZE_CODE
        .captures(package)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str());
    NormalizedPart {
        package: size.to_string(),
        value,
        kind: Some(kind),
    }
}

fn sot_package(package: &str) -> String {
    match package.strip_prefix("SOT") {
        Some(rest) if !rest.starts_with('-') => format!("SOT-{rest}"),
        _ => package.to_string(),
    }
}

static OHM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)R(\s+\d+(?:\.\d+)?%)?$").expect("valid regex"));
static R_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)R(\d+)(.*)$").expect("valid regex"));
static MULTIPLIER_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([KM])(\d+)(.*)$").expect("valid regex"));
static PLAIN_OHMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(\s+\d+(?:\.\d+)?%)?$").expect("valid regex"));

/// Rewrite a resistor value into the form used by catalog descriptions.
///
/// `10R` → `10OHM`, `4R7` → `4.7`, `4K7` → `4.7K`, `330` → `330OHM`.
/// Tolerance suffixes such as ` 1%` are kept. Anything else is returned as is.
pub fn resistor_value(value: &str) -> String {
    if let Some(c) = OHM_MARKER.captures(value) {
        return format!("{}OHM{}", &c[1], c.get(2).map_or("", |m| m.as_str()));
    }
    if let Some(c) = R_DECIMAL.captures(value) {
        return format!("{}.{}{}", &c[1], &c[2], &c[3]);
    }
    if let Some(c) = MULTIPLIER_DECIMAL.captures(value) {
        return format!("{}.{}{}{}", &c[1], &c[3], &c[2], &c[4]);
    }
    if let Some(c) = PLAIN_OHMS.captures(value) {
        return format!("{}OHM{}", &c[1], c.get(2).map_or("", |m| m.as_str()));
    }
    value.to_string()
}

static LED_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"LED\d{4,5}").expect("valid regex"));

/// Fallback for packages no rule claimed: blank it, except for an embedded
/// `LED####` size code.
pub fn long_package(package: &str, value: &str) -> NormalizedPart {
    match LED_CODE.find(package) {
        Some(m) => NormalizedPart {
            package: m.as_str().to_string(),
            value: value.to_string(),
            kind: Some(PartKind::Led),
        },
        None => NormalizedPart {
            package: String::new(),
            value: value.to_string(),
            kind: None,
        },
    }
}
