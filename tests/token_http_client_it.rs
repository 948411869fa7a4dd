#![cfg(feature = "reqwest")]

// self
use tiktok_oauth2::{
	_preludet::*,
	config::AuthOptions,
	error::{ConfigError, Error, Result, TransientError, TransportError},
	flows::{Authenticator, AuthorizeOverrides, CallbackParams},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
	provider::{GrantType, ProviderStrategy, TiktokStrategy, tiktok},
};

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	retry_after: Duration,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { retry_after }
	}
}
impl ProviderHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, retry_after: self.retry_after }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	retry_after: Duration,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let retry_after = self.retry_after;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RecordedCall {
	grant: GrantType,
	endpoint: &'static str,
	meta: Option<ResponseMetadata>,
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	calls: Arc<Mutex<Vec<RecordedCall>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded_calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		grant: GrantType,
		endpoint: &'static str,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);
		let retry_after = meta.and_then(|value| value.retry_after);

		self.calls.lock().push(RecordedCall { grant, endpoint, meta: meta.cloned() });

		let _ = strategy;

		match err {
			HttpClientError::Reqwest(inner) => TransientError::TokenEndpoint {
				message: format!("Fake transport error on {endpoint}: {inner}"),
				status,
				retry_after,
			}
			.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => TransientError::TokenEndpoint {
				message: format!("Unhandled HTTP client error variant: {other:?}"),
				status,
				retry_after,
			}
			.into(),
		}
	}
}

fn build_authenticator(
	retry_after: Duration,
	mapper: Arc<RecordingTransportErrorMapper>,
) -> Authenticator<FakeHttpClient, RecordingTransportErrorMapper> {
	let descriptor = tiktok::descriptor().expect("Stock descriptor should build successfully.");
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(TiktokStrategy);
	let http_client = Arc::new(FakeHttpClient::throttled(retry_after));

	Authenticator::with_http_client(descriptor, strategy, "throttled-client", http_client, mapper)
		.with_client_secret("throttled-secret")
		.with_options(AuthOptions::default().with_provider_ignores_state(true))
}

#[tokio::test]
async fn fake_http_client_surfaces_metadata_on_callback() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let authenticator = build_authenticator(Duration::seconds(5), mapper.clone());
	let session = authenticator
		.start_authorization(
			Url::parse("https://app.example.com/auth/tiktok/callback")
				.expect("Redirect URI fixture should parse successfully."),
			AuthorizeOverrides::default(),
		)
		.expect("Authorization session should start successfully.");
	let params = CallbackParams { code: Some("code-throttled".into()), ..Default::default() };
	let err = authenticator
		.callback(&session, params)
		.await
		.expect_err("Request should be throttled with HTTP 429.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
	assert_eq!(
		mapper.recorded_calls(),
		vec![RecordedCall {
			grant: GrantType::AuthorizationCode,
			endpoint: "token",
			meta: Some(ResponseMetadata {
				status: Some(429),
				retry_after: Some(Duration::seconds(5)),
			}),
		}]
	);
}

#[tokio::test]
async fn fake_mapper_captures_refresh_metadata() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let authenticator = build_authenticator(Duration::seconds(30), mapper.clone());
	let _ = authenticator
		.refresh("rft.throttled")
		.await
		.expect_err("Request should be throttled with HTTP 429.");
	let observed = mapper.recorded_calls();

	assert_eq!(observed.len(), 1, "Mapper must record a single request.");

	let call = observed.first().expect("Mapper should record the refresh attempt.");

	assert_eq!(call.grant, GrantType::RefreshToken);
	assert_eq!(call.endpoint, "token");

	let meta = call.meta.clone().expect("Response metadata should be recorded exactly once.");

	assert_eq!(meta.status, Some(429));
	assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
}
