//! AWS Lambda function that calls the hello-world function through the API.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    traced_invocations_lambda_invoker::run().await
}
