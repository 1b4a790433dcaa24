// AWS Lambda binary entry point
//
// Build with: cargo build -p logmask-emitter --release
// The binary must be named `bootstrap` for the provided.al2023 runtime.
//
// The lambda_runtime crate drives the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    logmask_emitter::run().await
}
