// HTTP surface: flight options, TwiML and the voice relay websocket

use crate::display::FlightCard;
use crate::flight::SearchRequest;
use crate::planner::FlightPlanner;
use crate::voice_relay::{twiml_document, CallState, VoiceRelay, WELCOME_GREETING};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub planner: FlightPlanner,
    pub relay: Arc<VoiceRelay>,
    pub ws_url: String,
    pub currency: String,
    pub locale: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/flights", get(flights_handler))
        .route("/twiml", post(twiml_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlightOptions {
    pub flights: Vec<FlightCard>,
}

async fn flights_handler(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Json<FlightOptions> {
    let request = SearchRequest::new(
        query.origin,
        query.destination,
        query.outbound_date,
        query.return_date,
    )
    .with_currency(query.currency.unwrap_or_else(|| state.currency.clone()))
    .with_locale(state.locale.clone());

    let flights = state.planner.cheapest_flights(&request).await;
    Json(FlightOptions { flights })
}

async fn twiml_handler(State(state): State<AppState>) -> Response {
    match twiml_document(&state.ws_url, WELCOME_GREETING) {
        Ok(xml) => ([(header::CONTENT_TYPE, "text/xml")], xml).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build TwiML");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_socket(socket, state.relay))
}

async fn relay_socket(socket: WebSocket, relay: Arc<VoiceRelay>) {
    let (mut sender, mut receiver) = socket.split();
    let mut call = CallState::default();

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(call_sid = ?call.call_sid, error = %e, "Websocket receive failed");
                break;
            }
        };

        let Some(reply) = relay.handle_text(&mut call, &text).await else {
            continue;
        };
        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to encode reply");
                continue;
            }
        };
        if sender.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }

    relay.disconnect(&call);
}
