//! Navigate from the cart to checkout on the storefront

use storefront_e2e::cli;
use storefront_e2e::testing::builtin;

#[tokio::main]
async fn main() {
    std::process::exit(cli::run_standalone(builtin::NAVIGATE_TO_CHECKOUT).await);
}
