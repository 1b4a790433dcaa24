// AWS Lambda runtime adapter for the synthetic event emitter
//
// Invoked by the schedule rule once a minute with an EventBridge scheduled
// event. Each invocation is independent: fresh RNG, no shared state.
// Log lines go to stdout, which the Lambda runtime forwards to the bound
// log group where the data protection policy masks them.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tracing::{debug, info, info_span};

mod synthetic;

pub use synthetic::{generate, SyntheticEvent, EMAIL_DOMAIN};

/// Write the event's messages to the log sink, one line each
pub fn emit(event: &SyntheticEvent) {
    for message in &event.messages {
        info!("{}", message);
    }
}

/// Lambda handler for scheduled invocations
async fn handle_event(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let span = info_span!("emit", request_id = %context.request_id);
    let _guard = span.enter();

    debug!(event = %payload, "Received scheduled event");

    let mut rng = StdRng::from_entropy();
    let synthetic = generate(&mut rng);
    emit(&synthetic);

    Ok(json!({ "emitted": synthetic.messages.len() }))
}

/// Initialize JSON logging for CloudWatch.
///
/// No timestamps or ANSI colors: CloudWatch stamps each line itself.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logmask_emitter=debug"));

    // Ignore error if a subscriber is already set (idempotent)
    let _ = fmt()
        .json()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init();
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_event)).await
}
