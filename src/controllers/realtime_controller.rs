use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;

use crate::AppState;

// GET /events  (SSE)
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sub = state.bus.subscribe_all();

    let stream = futures_util::stream::unfold(sub, |mut sub| async {
        let msg = sub.recv().await?;
        let evt = Event::default()
            .event(msg.topic)
            .data(msg.payload.to_string());

        Some((Ok(evt), sub))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}
