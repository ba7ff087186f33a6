// Built-in keyword tables.
//
// All phrases are lowercase; matching is case-insensitive with word boundaries,
// so "Schedule F" in a headline matches "schedule f" here.

use std::collections::HashMap;

use super::{Category, KeywordRuleSet, SuppressionRule, VolumeThresholds};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rule(keyword: &str, suppress: &[&str], downweight: &[&str]) -> SuppressionRule {
    SuppressionRule {
        keyword: keyword.to_string(),
        suppress_if_any: strings(suppress),
        downweight_if_any: strings(downweight),
    }
}

/// Phrases that, near a match, mean the text is reporting the absence or
/// reversal of the concerning action. Longer phrases first so the recorded
/// reason is the most specific one.
pub fn negation_phrases() -> Vec<String> {
    strings(&[
        "no evidence of",
        "no evidence",
        "no plans to",
        "did not",
        "does not",
        "will not",
        "false claim",
        "debunked",
        "struck down",
        "denies",
        "denied",
        "rejected",
    ])
}

/// Agencies whose reporting counts as authoritative corroboration.
pub fn authoritative_sources() -> Vec<String> {
    strings(&[
        "government accountability office",
        "gao",
        "congressional budget office",
        "inspector general",
        "council of the inspectors general",
        "office of special counsel",
        "merit systems protection board",
        "supreme court",
        "court of appeals",
        "district court",
    ])
}

/// Language marking a drift-tier signal as part of a broader pattern.
pub fn pattern_phrases() -> Vec<String> {
    strings(&[
        "unprecedented",
        "systematic",
        "pattern of",
        "multiple",
        "repeated",
    ])
}

pub fn category_rules() -> HashMap<Category, KeywordRuleSet> {
    let mut rules = HashMap::new();

    rules.insert(
        Category::CivilService,
        KeywordRuleSet {
            capture: strings(&[
                "schedule f",
                "schedule policy/career",
                "mass firing",
                "loyalty test",
            ]),
            drift: strings(&[
                "reduction in force",
                "reclassification",
                "probationary employees",
                "hiring freeze",
                "at-will",
            ]),
            warning: strings(&[
                "reorganization",
                "workforce reduction",
                "deferred resignation",
                "buyout",
            ]),
            suppressions: vec![
                rule(
                    "reduction in force",
                    &["enjoined", "temporary restraining order"],
                    &["voluntary"],
                ),
                rule("reclassification", &["position description"], &["proposed"]),
            ],
            volume: Some(VolumeThresholds {
                drift: 25,
                capture: 50,
            }),
        },
    );

    rules.insert(
        Category::Fiscal,
        KeywordRuleSet {
            capture: strings(&[
                "impoundment",
                "pocket rescission",
                "antideficiency act violation",
                "withheld appropriated funds",
            ]),
            drift: strings(&[
                "funding freeze",
                "apportionment footnote",
                "grant termination",
                "spending pause",
                "deferral",
            ]),
            warning: strings(&[
                "rescission",
                "budget cut",
                "reprogramming",
                "continuing resolution",
            ]),
            suppressions: vec![
                rule("funding freeze", &["freeze lifted"], &["temporary"]),
                rule("deferral", &["student loan", "loan deferral"], &[]),
            ],
            volume: Some(VolumeThresholds {
                drift: 20,
                capture: 40,
            }),
        },
    );

    rules.insert(
        Category::Igs,
        KeywordRuleSet {
            capture: strings(&[
                "inspector general fired",
                "inspector general removed",
                "inspectors general removed",
                "obstruction of oversight",
            ]),
            drift: strings(&[
                "acting inspector general",
                "access denied",
                "subpoena refused",
                "report withheld",
            ]),
            warning: strings(&["vacancy", "delayed report", "budget reduction"]),
            suppressions: vec![rule("access denied", &["access restored"], &["partially"])],
            volume: Some(VolumeThresholds {
                drift: 10,
                capture: 20,
            }),
        },
    );

    rules.insert(
        Category::HatchAct,
        KeywordRuleSet {
            capture: strings(&[
                "hatch act violation",
                "coerced political activity",
                "official authority to influence an election",
            ]),
            drift: strings(&[
                "political activity",
                "campaign event",
                "partisan messaging",
                "official resources",
            ]),
            warning: strings(&["hatch act", "endorsement"]),
            suppressions: vec![
                rule("hatch act", &["training", "guidance reminder"], &[]),
                rule("political activity", &["off duty"], &["advisory opinion"]),
            ],
            volume: None,
        },
    );

    rules.insert(
        Category::Courts,
        KeywordRuleSet {
            capture: strings(&[
                "defied court order",
                "noncompliance with court order",
                "contempt of court",
            ]),
            drift: strings(&[
                "emergency stay",
                "nationwide injunction",
                "court order",
                "sanctions",
            ]),
            warning: strings(&["lawsuit", "temporary restraining order", "appeal"]),
            suppressions: vec![
                rule("contempt of court", &["motion denied"], &["motion for"]),
                rule("sanctions", &["trade sanctions", "economic sanctions"], &[]),
            ],
            volume: Some(VolumeThresholds {
                drift: 15,
                capture: 30,
            }),
        },
    );

    rules.insert(
        Category::Military,
        KeywordRuleSet {
            capture: strings(&[
                "insurrection act",
                "domestic deployment",
                "troops deployed against protesters",
            ]),
            drift: strings(&[
                "national guard federalized",
                "posse comitatus",
                "generals fired",
            ]),
            warning: strings(&["national guard", "deployment", "leadership change"]),
            suppressions: vec![
                rule(
                    "national guard",
                    &["hurricane", "wildfire", "flood", "disaster relief"],
                    &[],
                ),
                rule("deployment", &["overseas", "nato exercise"], &[]),
                rule("insurrection act", &[], &["considering", "hypothetical"]),
            ],
            volume: Some(VolumeThresholds {
                drift: 10,
                capture: 20,
            }),
        },
    );

    rules.insert(
        Category::Rulemaking,
        KeywordRuleSet {
            capture: strings(&[
                "without notice and comment",
                "good cause exemption",
            ]),
            drift: strings(&[
                "interim final rule",
                "regulatory freeze",
                "guidance withdrawn",
            ]),
            warning: strings(&["delayed effective date", "regulatory review", "rescinded"]),
            suppressions: vec![rule(
                "interim final rule",
                &[],
                &["technical amendment", "correction"],
            )],
            volume: Some(VolumeThresholds {
                drift: 40,
                capture: 80,
            }),
        },
    );

    rules
}
