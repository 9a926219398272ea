//! AWS Lambda function behind the root route of the traced invocations API.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    traced_invocations_lambda_hello_world::run().await
}
