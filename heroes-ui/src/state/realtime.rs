//! Push Channel Client
//!
//! Browser transports for the Socket.IO push channel. A `web_sys::WebSocket`
//! is tried first; if it never opens, HTTP long-polling with gloo-net takes
//! over. Both feed the shared `PushProtocol` machine. A transport that stays
//! silent past the handshake or heartbeat window is dropped. Dropped
//! connections are retried with backoff, and `close` leaves the namespace
//! exactly once.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use humble_heroes::push::{
    decode_payload, encode_payload, endpoint_url, Backoff, EnginePacket, ProtocolOutput,
    ProtocolState, PushEvent, PushProtocol, TransportKind, DEFAULT_TRANSPORTS,
    HANDSHAKE_TIMEOUT_MS,
};
use leptos::spawn_local;

use super::global::GlobalState;

const RECONNECT_ATTEMPTS: u32 = 5;

struct Inner {
    base_url: String,
    protocol: PushProtocol,
    ws: Option<WebSocket>,
    /// Index into `DEFAULT_TRANSPORTS` of the transport in use
    transport: usize,
    /// Bumped on every connect so handlers of a dead socket stay quiet
    generation: u32,
    backoff: Backoff,
    /// Polling session id, once the handshake is done
    sid: Option<String>,
    /// Fires when the transport has been silent too long
    watchdog: Option<Timeout>,
    closed: bool,
}

/// Push channel owned by the page
#[derive(Clone)]
pub struct PushClient {
    inner: Rc<RefCell<Inner>>,
}

impl PushClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                base_url: base_url.to_string(),
                protocol: PushProtocol::new(),
                ws: None,
                transport: 0,
                generation: 0,
                backoff: Backoff::new(RECONNECT_ATTEMPTS),
                sid: None,
                watchdog: None,
                closed: false,
            })),
        }
    }

    /// Connect with the current transport
    pub fn connect(&self, state: GlobalState) {
        let (kind, generation, url) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.generation += 1;
            inner.protocol = PushProtocol::new();
            inner.sid = None;
            let kind = DEFAULT_TRANSPORTS[inner.transport];
            (kind, inner.generation, endpoint_url(&inner.base_url, kind, None))
        };

        web_sys::console::log_1(&format!("Opening push channel ({})", kind).into());
        self.arm_watchdog(generation, &state);

        match kind {
            TransportKind::Websocket => match WebSocket::new(&url) {
                Ok(ws) => {
                    self.setup_handlers(&ws, generation, state);
                    self.inner.borrow_mut().ws = Some(ws);
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                    self.transport_failed(state);
                }
            },
            TransportKind::Polling => {
                let client = self.clone();
                spawn_local(async move {
                    client.run_polling(generation, url, state).await;
                });
            }
        }
    }

    fn is_current(&self, generation: u32) -> bool {
        let inner = self.inner.borrow();
        !inner.closed && inner.generation == generation
    }

    /// Set up WebSocket event handlers
    fn setup_handlers(&self, ws: &WebSocket, generation: u32, state: GlobalState) {
        // On message
        let client = self.clone();
        let state_clone = state.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if !client.is_current(generation) {
                return;
            }
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                let outputs = client.inner.borrow_mut().protocol.handle_text(&text);
                let outgoing = client.route(outputs, &state_clone);
                client.send_ws(&outgoing);
                client.arm_watchdog(generation, &state_clone);

                let finished = client.inner.borrow().protocol.is_closed();
                if finished {
                    if let Some(ws) = client.inner.borrow().ws.as_ref() {
                        let _ = ws.close();
                    }
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let client = self.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("Push socket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            if !client.is_current(generation) {
                return;
            }
            client.inner.borrow_mut().ws = None;
            client.transport_ended(&state);
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("Push socket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Give the current transport until its next deadline to say something
    fn arm_watchdog(&self, generation: u32, state: &GlobalState) {
        let delay = watchdog_delay(&self.inner.borrow().protocol);
        let client = self.clone();
        let state = state.clone();
        let timer = Timeout::new(delay, move || client.transport_silent(generation, state));
        // Replacing the old timer cancels it
        self.inner.borrow_mut().watchdog = Some(timer);
    }

    fn disarm_watchdog(&self) {
        self.inner.borrow_mut().watchdog = None;
    }

    /// Nothing arrived in time: drop the transport as if it had closed
    fn transport_silent(&self, generation: u32, state: GlobalState) {
        let ws = {
            let mut inner = self.inner.borrow_mut();
            // This timer is the one running; it must not be dropped from its own callback
            if let Some(timer) = inner.watchdog.take() {
                timer.forget();
            }
            if inner.closed || inner.generation != generation {
                return;
            }
            // Quiet the old transport's handlers and polling loop
            inner.generation += 1;
            inner.ws.take()
        };

        let waiting_for = match self.inner.borrow().protocol.state() {
            ProtocolState::AwaitingOpen => "open packet",
            _ => "heartbeat",
        };
        web_sys::console::error_1(&format!("Push channel timed out waiting for {}", waiting_for).into());

        if let Some(ws) = ws {
            ws.set_onclose(None);
            let _ = ws.close();
        }
        self.transport_ended(&state);
    }

    /// Hand events to the page; return packets for the transport
    fn route(&self, outputs: Vec<ProtocolOutput>, state: &GlobalState) -> Vec<EnginePacket> {
        let mut outgoing = Vec::new();
        for output in outputs {
            match output {
                ProtocolOutput::Send(packet) => outgoing.push(packet),
                ProtocolOutput::Event(PushEvent::Connected { sid }) => {
                    web_sys::console::log_1(&format!("Push channel connected: {}", sid).into());
                    self.inner.borrow_mut().backoff.reset();
                    if state.liveness.is_alive() {
                        state.connected.set(true);
                    }
                }
                ProtocolOutput::Event(PushEvent::NewHero(hero)) => state.push_hero(hero),
                ProtocolOutput::Event(PushEvent::Disconnected { reason }) => {
                    web_sys::console::log_1(&format!("Push channel disconnected: {}", reason).into());
                    if state.liveness.is_alive() {
                        state.connected.set(false);
                    }
                }
            }
        }
        outgoing
    }

    fn send_ws(&self, packets: &[EnginePacket]) {
        let inner = self.inner.borrow();
        let Some(ws) = inner.ws.as_ref() else {
            return;
        };
        for packet in packets {
            if let Err(e) = ws.send_with_str(&packet.encode()) {
                web_sys::console::error_1(&format!("Push send failed: {:?}", e).into());
            }
        }
    }

    /// The transport went away. Decide between the next transport, a
    /// delayed reconnect, or giving up.
    fn transport_ended(&self, state: &GlobalState) {
        self.disarm_watchdog();
        let (phase, may_reconnect) = {
            let inner = self.inner.borrow();
            (inner.protocol.state(), inner.protocol.may_reconnect())
        };
        if state.liveness.is_alive() {
            state.connected.set(false);
        }

        match phase {
            ProtocolState::AwaitingOpen => self.transport_failed(state.clone()),
            _ if may_reconnect => self.schedule_reconnect(state.clone()),
            _ => {}
        }
    }

    /// The current transport never opened: try the next one, or back off
    fn transport_failed(&self, state: GlobalState) {
        self.disarm_watchdog();
        let next = {
            let mut inner = self.inner.borrow_mut();
            if inner.transport + 1 < DEFAULT_TRANSPORTS.len() {
                inner.transport += 1;
                true
            } else {
                inner.transport = 0;
                false
            }
        };

        if next {
            self.connect(state);
        } else {
            self.schedule_reconnect(state);
        }
    }

    /// Schedule a reconnect attempt
    fn schedule_reconnect(&self, state: GlobalState) {
        let delay = self.inner.borrow_mut().backoff.next_delay_ms();
        let Some(delay) = delay else {
            web_sys::console::error_1(&"Push channel: max reconnect attempts reached".into());
            if state.liveness.is_alive() {
                state.show_error("Live updates unavailable");
            }
            return;
        };

        let client = self.clone();
        gloo_timers::callback::Timeout::new(delay as u32, move || {
            client.connect(state);
        })
        .forget();
    }

    async fn run_polling(&self, generation: u32, handshake_url: String, state: GlobalState) {
        let body = match poll_get(&handshake_url).await {
            Ok(body) => body,
            Err(e) => {
                web_sys::console::error_1(&format!("Polling handshake failed: {}", e).into());
                if self.is_current(generation) {
                    self.transport_failed(state);
                }
                return;
            }
        };

        if !self.is_current(generation) {
            return;
        }
        let mut outgoing = self.handle_payload(&body, &state);
        self.arm_watchdog(generation, &state);
        let handshake_sid = self.inner.borrow().protocol.handshake().map(|h| h.sid.clone());
        let Some(sid) = handshake_sid else {
            web_sys::console::error_1(&"Polling handshake without a session id".into());
            self.transport_failed(state);
            return;
        };
        let session_url = {
            let mut inner = self.inner.borrow_mut();
            let url = endpoint_url(&inner.base_url, TransportKind::Polling, Some(&sid));
            inner.sid = Some(sid);
            url
        };

        loop {
            if !self.is_current(generation) {
                return;
            }
            if !outgoing.is_empty() {
                let packets = std::mem::take(&mut outgoing);
                if let Err(e) = poll_post(&session_url, &packets).await {
                    web_sys::console::error_1(&format!("Polling send failed: {}", e).into());
                    break;
                }
            }
            if self.inner.borrow().protocol.is_closed() {
                break;
            }

            match poll_get(&session_url).await {
                Ok(body) => {
                    if !self.is_current(generation) {
                        return;
                    }
                    outgoing = self.handle_payload(&body, &state);
                    self.arm_watchdog(generation, &state);
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Polling request failed: {}", e).into());
                    break;
                }
            }
        }

        if self.is_current(generation) {
            self.transport_ended(&state);
        }
    }

    fn handle_payload(&self, body: &str, state: &GlobalState) -> Vec<EnginePacket> {
        let packets = match decode_payload(body) {
            Ok(packets) => packets,
            Err(e) => {
                web_sys::console::error_1(&format!("Ignoring undecodable payload: {}", e).into());
                return Vec::new();
            }
        };

        let mut outgoing = Vec::new();
        for packet in packets {
            let outputs = self.inner.borrow_mut().protocol.handle(packet);
            outgoing.extend(self.route(outputs, state));
        }
        outgoing
    }

    /// Leave the namespace and shut the transport. Later calls do nothing.
    pub fn close(&self) {
        let (packets, ws, polling_url) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.watchdog = None;
            let packets: Vec<EnginePacket> = inner
                .protocol
                .close()
                .into_iter()
                .filter_map(|output| match output {
                    ProtocolOutput::Send(packet) => Some(packet),
                    ProtocolOutput::Event(_) => None,
                })
                .collect();
            let polling_url = inner
                .sid
                .as_deref()
                .map(|sid| endpoint_url(&inner.base_url, TransportKind::Polling, Some(sid)));
            (packets, inner.ws.take(), polling_url)
        };

        if let Some(ws) = ws {
            for packet in &packets {
                let _ = ws.send_with_str(&packet.encode());
            }
            let _ = ws.close();
        } else if let Some(url) = polling_url {
            if !packets.is_empty() {
                spawn_local(async move {
                    let _ = poll_post(&url, &packets).await;
                });
            }
        }
        web_sys::console::log_1(&"Push channel closed".into());
    }
}

/// Silence allowed on the current transport, in timer milliseconds
fn watchdog_delay(protocol: &PushProtocol) -> u32 {
    protocol
        .frame_timeout_ms(HANDSHAKE_TIMEOUT_MS)
        .min(u64::from(u32::MAX)) as u32
}

async fn poll_get(url: &str) -> Result<String, String> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    if !response.ok() {
        return Err(format!("Status {}", response.status()));
    }
    response.text().await.map_err(|e| format!("Read error: {}", e))
}

async fn poll_post(url: &str, packets: &[EnginePacket]) -> Result<(), String> {
    let response = Request::post(url)
        .header("Content-Type", "text/plain;charset=UTF-8")
        .body(encode_payload(packets))
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    if !response.ok() {
        return Err(format!("Status {}", response.status()));
    }
    Ok(())
}
