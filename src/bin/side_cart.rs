//! Open the side cart drawer on the storefront

use storefront_e2e::cli;
use storefront_e2e::testing::builtin;

#[tokio::main]
async fn main() {
    std::process::exit(cli::run_standalone(builtin::SIDE_CART).await);
}
