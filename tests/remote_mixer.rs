use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use volume_control::{
    AudioSubsystem, Endpoint, InitState, MediaRoster, Method, MixerConfig, MixerError, RemoteMixer,
    Request, Response, VolumeControl, VolumeError,
};

/// Mixer service double: one mixer node with a gain and a mute control
#[derive(Default)]
struct FakeService {
    gain: Option<f64>,
    mute: i64,
    released: Vec<String>,
    writes: Vec<(String, Value)>,
    no_gain: bool,
    read_only: bool,
    silent: bool,
    ignore_release: bool,
}

impl FakeService {
    fn new(gain: f64) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            gain: Some(gain),
            ..Default::default()
        }))
    }

    fn respond(&mut self, request: &Request) -> Response {
        let reply = Response::reply_to(request);
        let target = request.meta.target.clone().unwrap_or_default();

        match (request.meta.endpoint, request.meta.method) {
            (Endpoint::AudioMixer, Method::Read) => {
                reply.with_data(json!({ "node": 3, "name": "System Mixer" }))
            }
            (Endpoint::ParameterWeb, Method::Read) if target == "3" => {
                let mut parameters = vec![json!({ "id": "label", "kind": "", "type": "null" })];
                if !self.no_gain {
                    parameters.push(json!({
                        "id": "gain",
                        "kind": "master_gain",
                        "name": "Master",
                        "type": "continuous",
                        "min": -60.0,
                        "max": 18.0,
                        "step": 0.5
                    }));
                }
                parameters.push(json!({
                    "id": "mute",
                    "kind": "mute",
                    "type": "discrete",
                    "items": [{ "value": 0, "name": "Off" }, { "value": 1, "name": "On" }]
                }));
                reply.with_data(json!({ "parameters": parameters }))
            }
            (Endpoint::Node, Method::Release) => {
                self.released.push(target);
                reply
            }
            (Endpoint::Parameter, Method::Read) => match target.as_str() {
                // serde_json writes NaN as null
                "gain" => reply.with_data(json!({ "value": self.gain })),
                "mute" => reply.with_data(json!({ "value": self.mute })),
                _ => reply.with_error(format!("no parameter {}", target)),
            },
            (Endpoint::Parameter, Method::Write) => {
                if self.read_only {
                    return reply.with_error("mixer is read-only");
                }
                let value = request.data.as_ref().and_then(|d| d.get("value")).cloned().unwrap_or(Value::Null);
                self.writes.push((target.clone(), value.clone()));
                match target.as_str() {
                    "gain" => self.gain = value.as_f64(),
                    "mute" => self.mute = value.as_i64().unwrap_or(0),
                    _ => return reply.with_error(format!("no parameter {}", target)),
                }
                reply
            }
            _ => reply.with_error("unsupported request"),
        }
    }
}

async fn serve(stream: TcpStream, service: Arc<Mutex<FakeService>>) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };

    while let Some(Ok(msg)) = ws.next().await {
        if let Message::Text(text) = msg {
            let request: Request = serde_json::from_str(&text).unwrap();
            let reply = {
                let mut service = service.lock().unwrap();
                if service.silent {
                    continue;
                }
                let reply = service.respond(&request);
                if service.ignore_release && request.meta.endpoint == Endpoint::Node {
                    continue;
                }
                reply
            };
            let json = serde_json::to_string(&reply).unwrap();
            if ws.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    }
}

/// Start the service on its own thread and return its URL
fn spawn_service(service: Arc<Mutex<FakeService>>) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, service.clone()));
            }
        });
    });

    let port = rx.recv().unwrap();
    format!("ws://127.0.0.1:{}/mixer", port)
}

fn remote(url: String) -> RemoteMixer {
    RemoteMixer::new(MixerConfig::new(url).with_request_timeout(Duration::from_millis(500)))
}

/// Node releases are not acknowledged, so wait for the service to see them
fn wait_for_releases(service: &Arc<Mutex<FakeService>>, count: usize) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let released = service.lock().unwrap().released.clone();
        if released.len() >= count || Instant::now() > deadline {
            return released;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_remote_discovery_and_operations() {
    let service = FakeService::new(-10.0);
    let control = VolumeControl::discover(&remote(spawn_service(service.clone())));

    assert_eq!(control.init_check(), InitState::Ready);
    assert_eq!(wait_for_releases(&service, 1), vec!["3".to_string()]);

    assert_eq!(control.volume().unwrap(), -10.0);
    assert_eq!(control.step_size().unwrap(), 0.5);

    control.adjust_volume(-60.0).unwrap();
    assert_eq!(control.volume().unwrap(), -60.0);

    control.set_volume(100.0).unwrap();
    assert_eq!(service.lock().unwrap().gain, Some(18.0));

    control.toggle_mute().unwrap();
    assert!(control.is_muted().unwrap());
    control.set_mute(false).unwrap();
    assert!(!control.is_muted().unwrap());

    let writes = service.lock().unwrap().writes.clone();
    assert_eq!(
        writes,
        vec![
            ("gain".to_string(), json!(-60.0)),
            ("gain".to_string(), json!(18.0)),
            ("mute".to_string(), json!(1)),
            ("mute".to_string(), json!(0)),
        ]
    );
}

#[test]
fn test_remote_null_gain_is_read_error() {
    let service = FakeService::new(-10.0);
    let control = VolumeControl::discover(&remote(spawn_service(service.clone())));
    service.lock().unwrap().gain = None;

    assert!(matches!(control.volume(), Err(VolumeError::Read(MixerError::InvalidValue(_)))));
}

#[test]
fn test_remote_service_errors_become_write_errors() {
    let service = FakeService::new(-10.0);
    let control = VolumeControl::discover(&remote(spawn_service(service.clone())));
    service.lock().unwrap().read_only = true;

    match control.set_volume(0.0) {
        Err(VolumeError::Write(MixerError::ApiError { detail })) => assert_eq!(detail, "mixer is read-only"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(service.lock().unwrap().gain, Some(-10.0));
}

#[test]
fn test_remote_missing_gain_control() {
    let service = FakeService::new(-10.0);
    service.lock().unwrap().no_gain = true;
    let control = VolumeControl::discover(&remote(spawn_service(service.clone())));

    assert_eq!(control.init_check(), InitState::GainControlNotFound);
    assert_eq!(wait_for_releases(&service, 1).len(), 1);
}

#[test]
fn test_remote_release_does_not_wait_for_reply() {
    let service = FakeService::new(-10.0);
    service.lock().unwrap().ignore_release = true;
    let mixer = RemoteMixer::new(
        MixerConfig::new(spawn_service(service.clone())).with_request_timeout(Duration::from_secs(3)),
    );

    let started = Instant::now();
    let control = VolumeControl::discover(&mixer);
    let elapsed = started.elapsed();

    assert_eq!(control.init_check(), InitState::Ready);
    assert!(elapsed < Duration::from_secs(1), "discovery took {:?}", elapsed);
    assert_eq!(control.volume().unwrap(), -10.0);
    assert_eq!(wait_for_releases(&service, 1), vec!["3".to_string()]);
}

#[test]
fn test_remote_unreachable_service_is_roster_unavailable() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let control = VolumeControl::discover(&remote(format!("ws://127.0.0.1:{}/mixer", port)));

    assert_eq!(control.init_check(), InitState::RosterUnavailable);
    assert!(control.init_error().is_some());
    assert!(matches!(
        control.volume(),
        Err(VolumeError::NotInitialized(InitState::RosterUnavailable))
    ));
}

#[test]
fn test_remote_silent_service_times_out() {
    let service = FakeService::new(-10.0);
    service.lock().unwrap().silent = true;
    let mixer = remote(spawn_service(service));

    let roster = mixer.roster().unwrap();
    assert!(matches!(roster.audio_mixer(), Err(MixerError::Timeout)));

    let control = VolumeControl::discover(&mixer);
    assert_eq!(control.init_check(), InitState::MixerUnavailable);
    assert!(matches!(control.init_error(), Some(MixerError::Timeout)));
}
