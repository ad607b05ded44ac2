//! Built-in storefront scenarios
//!
//! The three storefront flows share a landing sequence and differ only in
//! the elements they click and the banner they expect, so they are plain
//! [`Scenario`] values.

use std::time::Duration;

use super::config::{LoadScope, LoadState, Locator, Scenario, Step};

pub const ADD_TO_CART: &str = "add-to-cart";
pub const SIDE_CART: &str = "side-cart";
pub const NAVIGATE_TO_CHECKOUT: &str = "navigate-to-checkout";

const NAVIGATION_TIMEOUT: Duration = Duration::from_millis(10_000);
const LOAD_STATE_TIMEOUT: Duration = Duration::from_millis(3_000);
const INTERACTION_TIMEOUT: Duration = Duration::from_millis(5_000);
const ASSERTION_TIMEOUT: Duration = Duration::from_millis(1_000);

const CATEGORY_CARD: &str =
    "html/body/div/div[2]/main/div/div/div[2]/a/div/div[2]/div/div[2]/button";
const CLEAR_FILTERS: &str = "html/body/div/div[2]/main/div[2]/div/div/button";
const FOOTER_LINK: &str = "html/body/div/div[2]/footer/div/div/div/div/a";
const HEADER_HOME: &str = "html/body/div/div[2]/header/div/div/nav/a";
const HEADER_CART: &str = "html/body/div/div[2]/header/div/div/div[2]/button[2]";
/// Category card once the cart drawer has been inserted before the layout
const CATEGORY_CARD_WITH_DRAWER: &str =
    "html/body/div/div[3]/main/div/div/div[2]/a/div/div[2]/div/div[2]/button";

/// Names of all built-in scenarios
pub fn names() -> &'static [&'static str] {
    &[ADD_TO_CART, SIDE_CART, NAVIGATE_TO_CHECKOUT]
}

/// Look up a built-in scenario by name
pub fn builtin(name: &str) -> Option<Scenario> {
    match name {
        ADD_TO_CART => Some(add_to_cart()),
        SIDE_CART => Some(side_cart()),
        NAVIGATE_TO_CHECKOUT => Some(navigate_to_checkout()),
        _ => None,
    }
}

/// Open the storefront home page and give it a chance to settle
fn landing_steps() -> Vec<Step> {
    vec![
        Step::navigate("/").timeout(NAVIGATION_TIMEOUT),
        Step::wait_for_load(LoadState::DomContentLoaded, LoadScope::Page)
            .timeout(LOAD_STATE_TIMEOUT)
            .best_effort(),
        Step::wait_for_load(LoadState::DomContentLoaded, LoadScope::Frames)
            .timeout(LOAD_STATE_TIMEOUT)
            .best_effort(),
    ]
}

fn click(xpath: &str) -> Step {
    Step::click(Locator::new(format!("xpath={}", xpath))).timeout(INTERACTION_TIMEOUT)
}

fn expect_text(text: &str, message: &str) -> Step {
    Step::assert_visible(Locator::new(format!("text={}", text)), message)
        .timeout(ASSERTION_TIMEOUT)
}

fn scenario(name: &str, description: &str, flow: Vec<Step>) -> Scenario {
    let mut steps = landing_steps();
    steps.extend(flow);
    Scenario::new(name, steps).with_description(description)
}

pub fn add_to_cart() -> Scenario {
    scenario(
        ADD_TO_CART,
        "Add a product to the cart from the small-flowers category",
        vec![
            Step::scroll_by(0, 500),
            Step::navigate_until("/products", LoadState::Load).timeout(NAVIGATION_TIMEOUT),
            Step::scroll_by(0, 500),
            Step::navigate_until("/", LoadState::Load).timeout(NAVIGATION_TIMEOUT),
            click(CATEGORY_CARD).note("open small-flowers category"),
            click(CLEAR_FILTERS).note("clear filters"),
            expect_text(
                "Product successfully added to cart!",
                "Test case failed: The product could not be added to the cart as expected. \
                 The cart side drawer did not open or the product did not appear in the cart \
                 after clicking 'Add to Cart'.",
            ),
        ],
    )
}

pub fn side_cart() -> Scenario {
    scenario(
        SIDE_CART,
        "Open the side cart drawer through category and header navigation",
        vec![
            click(CATEGORY_CARD).note("open category"),
            Step::scroll_by(0, 300),
            click(FOOTER_LINK).note("footer link"),
            click(HEADER_HOME).note("header home link"),
            click(CATEGORY_CARD).note("open category again"),
            expect_text(
                "Side Cart Loaded Successfully",
                "Test case failed: Side cart functionality verification failed as the side \
                 cart drawer did not open automatically or cart contents were incorrect.",
            ),
        ],
    )
}

pub fn navigate_to_checkout() -> Scenario {
    scenario(
        NAVIGATE_TO_CHECKOUT,
        "Open the cart and proceed to checkout",
        vec![
            click(HEADER_CART).note("open cart"),
            Step::scroll_page(1.0),
            Step::scroll_page(-1.0),
            click(CATEGORY_CARD_WITH_DRAWER).note("open category"),
            expect_text(
                "Checkout Complete! Thank you for your order",
                "Test case failed: Checkout navigation did not work as expected. The checkout \
                 page or form was not displayed after clicking the Checkout button.",
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SelectorStrategy, StepKind};

    #[test]
    fn test_every_name_resolves() {
        for name in names() {
            let scenario = builtin(name).unwrap();
            assert_eq!(scenario.name, *name);
            assert!(scenario.description.is_some());
        }
        assert!(builtin("checkout").is_none());
    }

    #[test]
    fn test_landing_sequence_shared() {
        for name in names() {
            let scenario = builtin(name).unwrap();
            assert_eq!(&scenario.steps[..3], &landing_steps()[..]);
            assert!(!scenario.steps[0].best_effort);
            assert!(scenario.steps[1].best_effort);
            assert!(scenario.steps[2].best_effort);
        }
    }

    #[test]
    fn test_last_step_is_required_assertion() {
        for name in names() {
            let scenario = builtin(name).unwrap();
            let last = scenario.steps.last().unwrap();
            assert!(!last.best_effort);
            match &last.kind {
                StepKind::AssertVisible {
                    locator,
                    timeout_ms,
                    message,
                } => {
                    assert!(matches!(
                        locator.strategy(),
                        SelectorStrategy::Text { exact: false, .. }
                    ));
                    assert_eq!(*timeout_ms, Some(1000));
                    assert!(message.starts_with("Test case failed:"));
                }
                other => panic!("expected assertion, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_interactions_use_positional_xpath() {
        let scenario = side_cart();
        let clicks: Vec<_> = scenario
            .steps
            .iter()
            .filter_map(|s| match &s.kind {
                StepKind::Interact {
                    locator,
                    timeout_ms,
                    ..
                } => Some((locator.clone(), *timeout_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(clicks.len(), 4);
        for (locator, timeout_ms) in clicks {
            assert!(matches!(locator.strategy(), SelectorStrategy::XPath(_)));
            assert_eq!(locator.index, 0);
            assert_eq!(timeout_ms, Some(5000));
        }
    }

    #[test]
    fn test_add_to_cart_page_visits_wait_for_load() {
        let scenario = add_to_cart();
        let visits: Vec<(String, LoadState)> = scenario
            .steps
            .iter()
            .skip(3)
            .filter_map(|s| match &s.kind {
                StepKind::Navigate {
                    url, wait_until, ..
                } => Some((url.clone(), *wait_until)),
                _ => None,
            })
            .collect();
        assert_eq!(
            visits,
            vec![
                ("/products".to_string(), LoadState::Load),
                ("/".to_string(), LoadState::Load),
            ]
        );
        assert!(scenario.steps.iter().skip(3).all(|s| !s.best_effort));
    }

    #[test]
    fn test_checkout_scrolls_a_page_each_way() {
        let scenario = navigate_to_checkout();
        let pages: Vec<f64> = scenario
            .steps
            .iter()
            .filter_map(|s| match s.kind {
                StepKind::ScrollPage { pages } => Some(pages),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![1.0, -1.0]);
    }
}
