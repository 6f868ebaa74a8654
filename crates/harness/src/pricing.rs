//! Built-in subscription-pricing checklist
//!
//! The default checklist run when no YAML file is given: verifies that the
//! pricing page renders its plans, prices, call-to-action links, metadata,
//! styling references, and basic accessibility attributes.

use crate::checklist::{
    Checklist, CountExpect, Probe, Require, Step, Viewport, WaitUntil,
};

pub const BASE_URL: &str = "http://localhost:8000";
pub const PRICING_PATH: &str = "/subscription/pricing/";
pub const TITLE_PHRASE: &str = "Planes y Precios";

const PLAN_INDIVIDUAL: &str = "Plan Individual";
const PLAN_ORGANIZATION: &str = "Plan Organización";
const PRICE_INDIVIDUAL: &str = "$3.990";
const PRICE_ORGANIZATION: &str = "$29.990";
const TRIAL_BUTTON: &str = "Comenzar Prueba de 14 Días";
const HREF_INDIVIDUAL: &str = "a[href=\"/registro/?plan=individual\"]";
const HREF_ORGANIZATION: &str = "a[href=\"/registro/?plan=organizacion\"]";
const EXPECTED_LANG: &str = "es";
const LOAD_BUDGET_MS: u64 = 3000;

/// Plan description fragments; at least three must be present on the page
const DESCRIPTION_FRAGMENTS: [&str; 5] = [
    "profesionales independientes",
    "legislación",
    "mercado chileno",
    "equipos y empresas",
    "múltiples usuarios",
];

fn text_selector(text: &str) -> String {
    format!("text={text}")
}

fn visible(text: &str) -> Probe {
    Probe::Visible { selector: text_selector(text) }
}

fn present(selector: &str) -> Probe {
    Probe::Count {
        selector: selector.to_string(),
        expect: CountExpect::AtLeast(1),
    }
}

fn check(name: &str, probes: Vec<Probe>) -> Step {
    Step::Check {
        name: name.to_string(),
        require: Require::All,
        probes,
    }
}

fn log(message: &str) -> Step {
    Step::Log { message: message.to_string() }
}

/// The built-in pricing checklist: 12 checks in the nominal path
pub fn pricing() -> Checklist {
    Checklist {
        name: "subscription-pricing".to_string(),
        description: "Pricing page renders plans, prices, and call-to-action links"
            .to_string(),
        tags: vec!["pricing".to_string(), "smoke".to_string()],
        base_url: BASE_URL.to_string(),
        viewport: Viewport { width: 1280, height: 720 },
        steps: vec![
            log("Checking the pricing page"),
            Step::Navigate {
                url: PRICING_PATH.to_string(),
                wait_until: WaitUntil::DomContentLoaded,
                timeout_ms: 10_000,
            },
            check(
                "pricing page loads",
                vec![Probe::Title { contains: TITLE_PHRASE.to_string() }],
            ),
            log("Checking subscription plans"),
            check(
                "subscription plans visible",
                vec![visible(PLAN_INDIVIDUAL), visible(PLAN_ORGANIZATION)],
            ),
            check(
                "plan prices correct",
                vec![
                    present(&text_selector(PRICE_INDIVIDUAL)),
                    present(&text_selector(PRICE_ORGANIZATION)),
                ],
            ),
            log("Checking call-to-action buttons"),
            check(
                "trial buttons present",
                vec![Probe::Count {
                    selector: text_selector(TRIAL_BUTTON),
                    expect: CountExpect::Exactly(2),
                }],
            ),
            check(
                "registration links configured",
                vec![present(HREF_INDIVIDUAL), present(HREF_ORGANIZATION)],
            ),
            log("Checking plan descriptions"),
            Step::Check {
                name: "plan descriptions present".to_string(),
                require: Require::AtLeast(3),
                probes: DESCRIPTION_FRAGMENTS
                    .iter()
                    .map(|fragment| present(&text_selector(fragment)))
                    .collect(),
            },
            log("Checking navigation"),
            Step::Click {
                selector: HREF_INDIVIDUAL.to_string(),
                timeout_ms: Some(5000),
            },
            Step::Sleep { ms: 1000 },
            check(
                "registration navigation works",
                vec![Probe::Url {
                    contains_any: vec!["/registro/".to_string(), "/login/".to_string()],
                }],
            ),
            log("Checking responsive layout"),
            Step::SetViewport { width: 375, height: 667 },
            Step::Navigate {
                url: PRICING_PATH.to_string(),
                wait_until: WaitUntil::Load,
                timeout_ms: 30_000,
            },
            Step::Sleep { ms: 500 },
            check(
                "responsive layout functional",
                vec![visible(PLAN_INDIVIDUAL), visible(PLAN_ORGANIZATION)],
            ),
            log("Checking metadata"),
            check(
                "html metadata present",
                vec![present("meta[name=\"viewport\"]"), present("meta[charset]")],
            ),
            log("Checking performance"),
            check(
                "page load time acceptable",
                vec![Probe::LoadTime {
                    url: PRICING_PATH.to_string(),
                    under_ms: LOAD_BUDGET_MS,
                    wait_until: WaitUntil::DomContentLoaded,
                }],
            ),
            log("Checking styles"),
            check(
                "css frameworks referenced",
                vec![
                    present("link[href*=\"bootstrap\"]"),
                    present("link[href*=\"font-awesome\"]"),
                ],
            ),
            log("Checking accessibility"),
            check(
                "basic accessibility in place",
                vec![
                    Probe::Property {
                        selector: "html".to_string(),
                        name: "lang".to_string(),
                        equals: EXPECTED_LANG.to_string(),
                    },
                    present("h1, h2, h3"),
                ],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_twelve_checks() {
        let checklist = pricing();
        assert_eq!(checklist.check_count(), 12);
    }

    #[test]
    fn builtin_navigates_to_pricing_first() {
        let checklist = pricing();
        let nav = checklist
            .steps
            .iter()
            .find_map(|s| match s {
                Step::Navigate { url, timeout_ms, .. } => Some((url.clone(), *timeout_ms)),
                _ => None,
            })
            .expect("checklist has a navigate step");
        assert_eq!(nav.0, PRICING_PATH);
        assert_eq!(nav.1, 10_000);
        assert_eq!(
            checklist.resolve(&nav.0),
            "http://localhost:8000/subscription/pricing/"
        );
    }

    #[test]
    fn builtin_round_trips_through_yaml() {
        let checklist = pricing();
        let yaml = serde_yaml::to_string(&checklist).unwrap();
        let parsed = Checklist::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.name, checklist.name);
        assert_eq!(parsed.steps.len(), checklist.steps.len());
        assert_eq!(parsed.check_count(), 12);
    }

    #[test]
    fn descriptions_check_requires_three_of_five() {
        let checklist = pricing();
        let Some(Step::Check { require, probes, .. }) = checklist
            .steps
            .iter()
            .find(|s| matches!(s, Step::Check { name, .. } if name == "plan descriptions present"))
        else {
            panic!("missing descriptions check");
        };
        assert!(matches!(require, Require::AtLeast(3)));
        assert_eq!(probes.len(), 5);
    }
}
