//! Client-side behavior of `HelloGrainClient`, tested against a scripted transport.

use grain_framework::mock::MockTransport;
use grain_framework::{
    ClusterIdentity, Envelope, GrainCallError, RequestEnvelope, TransportError,
};
use grain_sample::hello_grain::{GetCurrentState, HelloGrainClient, SayHello};
use grain_sample::model::{GetCurrentStateRequest, HelloRequest, HelloResponse};
use std::time::Duration;

const DEADLINE: Duration = Duration::from_millis(1000);

fn proto_potato() -> HelloRequest {
    HelloRequest {
        name: "Proto Potato".to_string(),
    }
}

#[tokio::test]
async fn test_response_is_decoded() {
    let mock = MockTransport::new();
    mock.expect_call::<SayHello>("MyGrain")
        .respond::<SayHello>(&HelloResponse {
            message: "scripted".into(),
        })
        .unwrap();

    let client: HelloGrainClient = mock.client("MyGrain");
    let reply = client.say_hello(&proto_potato(), DEADLINE).await.unwrap();
    assert_eq!(reply.message, "scripted");

    let (target, envelope) = mock.received().remove(0);
    assert_eq!(target, ClusterIdentity::new("HelloGrain", "MyGrain"));
    assert_eq!(envelope, RequestEnvelope::new::<SayHello>(&proto_potato()).unwrap());
    mock.verify();
}

#[tokio::test]
async fn test_error_envelope_is_remote_failure() {
    let mock = MockTransport::new();
    mock.expect_call::<SayHello>("MyGrain")
        .reply(Envelope::error("greeter is sulking"));

    let client: HelloGrainClient = mock.client("MyGrain");
    let err = client.say_hello(&proto_potato(), DEADLINE).await.unwrap_err();
    assert!(matches!(err, GrainCallError::Remote(ref m) if m == "greeter is sulking"));
    mock.verify();
}

#[tokio::test]
async fn test_request_shaped_reply_is_unsupported() {
    let mock = MockTransport::new();
    let echoed = RequestEnvelope::new::<SayHello>(&proto_potato()).unwrap();
    mock.expect_call::<SayHello>("MyGrain").reply(Envelope::Request(echoed));

    let client: HelloGrainClient = mock.client("MyGrain");
    let err = client.say_hello(&proto_potato(), DEADLINE).await.unwrap_err();
    assert!(matches!(err, GrainCallError::UnsupportedResponse("request")));
}

#[tokio::test]
async fn test_mismatched_response_payload_is_decode_error() {
    let mock = MockTransport::new();
    // A SayHello response arriving for a GetCurrentState call.
    let wrong = Envelope::response::<SayHello>(&HelloResponse {
        message: "not a state".into(),
    })
    .unwrap();
    mock.expect_call::<GetCurrentState>("MyGrain").reply(wrong);

    let client: HelloGrainClient = mock.client("MyGrain");
    let err = client
        .get_current_state(&GetCurrentStateRequest {}, DEADLINE)
        .await
        .unwrap_err();
    assert!(matches!(err, GrainCallError::Decode(_)));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_node_times_out_within_deadline() {
    let mock = MockTransport::new();
    mock.expect_call::<SayHello>("MyGrain").never_reply();

    let client: HelloGrainClient = mock.client("MyGrain");
    let started = tokio::time::Instant::now();
    let err = client.say_hello(&proto_potato(), DEADLINE).await.unwrap_err();

    assert!(matches!(err, GrainCallError::Timeout { deadline } if deadline == DEADLINE));
    assert!(started.elapsed() <= DEADLINE + Duration::from_millis(50));
}

#[tokio::test]
async fn test_transport_timeout_and_failure_mapping() {
    let mock = MockTransport::new();
    let target = ClusterIdentity::new("HelloGrain", "MyGrain");
    mock.expect_request(target.clone())
        .fail(TransportError::Timeout { deadline: DEADLINE });
    mock.expect_request(target.clone())
        .fail(TransportError::Unreachable(target.clone()));

    let client: HelloGrainClient = mock.client("MyGrain");
    let first = client.say_hello(&proto_potato(), DEADLINE).await.unwrap_err();
    assert!(first.is_timeout());

    let second = client.say_hello(&proto_potato(), DEADLINE).await.unwrap_err();
    assert!(matches!(
        second,
        GrainCallError::Transport(TransportError::Unreachable(_))
    ));
    mock.verify();
}
