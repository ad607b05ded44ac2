//! Add a product to the cart on the storefront

use storefront_e2e::cli;
use storefront_e2e::testing::builtin;

#[tokio::main]
async fn main() {
    std::process::exit(cli::run_standalone(builtin::ADD_TO_CART).await);
}
