use futures_util::StreamExt;
use futures_util::stream::{self, Stream};
use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use newsroom_protocol::{ByteStream, ChatTransport, ConsumerError, RelayRequest};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

/// Relay endpoint. Set `RELAY_URL` at build time to point elsewhere.
const RELAY_URL: &str = match option_env!("RELAY_URL") {
    Some(url) => url,
    None => "http://localhost:8080/api/ai-chat",
};

/// Browser `fetch` transport for the chat relay.
#[derive(Clone, Copy, Default)]
pub struct RelayTransport;

impl ChatTransport for RelayTransport {
    async fn post(&self, request: &RelayRequest) -> Result<ByteStream, ConsumerError> {
        let resp = Request::post(RELAY_URL)
            .json(request)
            .map_err(|e| ConsumerError::Network(format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| ConsumerError::Network(e.to_string()))?;

        if !resp.ok() {
            return Err(ConsumerError::Status { status: resp.status() });
        }

        let body = resp
            .body()
            .ok_or_else(|| ConsumerError::Read("response has no body".to_string()))?;
        let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
        Ok(body_chunks(reader).boxed_local())
    }
}

/// Yields body chunks as the browser receives them. A read error is yielded
/// once and ends the stream.
fn body_chunks(
    reader: ReadableStreamDefaultReader,
) -> impl Stream<Item = Result<Vec<u8>, ConsumerError>> {
    stream::unfold(Some(reader), |reader| async move {
        let reader = reader?;
        match read_chunk(&reader).await {
            Ok(Some(bytes)) => Some((Ok(bytes), Some(reader))),
            Ok(None) => None,
            Err(err) => Some((Err(err), None)),
        }
    })
}

async fn read_chunk(
    reader: &ReadableStreamDefaultReader,
) -> Result<Option<Vec<u8>>, ConsumerError> {
    let result = JsFuture::from(reader.read()).await.map_err(read_error)?;
    let done = Reflect::get(&result, &JsValue::from_str("done"))
        .map_err(read_error)?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }
    let value = Reflect::get(&result, &JsValue::from_str("value")).map_err(read_error)?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

fn read_error(err: JsValue) -> ConsumerError {
    ConsumerError::Read(format!("{err:?}"))
}
