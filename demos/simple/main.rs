use decision_client::{ClientConfig, TrackingEvent, UserContext};

pub fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/data/datafile.json".to_owned());

    let mut config = ClientConfig::from_datafile_path(path);
    config.event_dispatcher(|event: TrackingEvent| {
        println!("tracked: {}", serde_json::to_string(&event).unwrap_or_default());
    });
    let (client, engine) = config.to_client();

    // Start a poller thread to load the datafile.
    let poller = engine
        .start_poller_thread()
        .expect("failed to start poller thread")
        .expect("datafile path is configured");

    // Block waiting for the first load. Until this call returns, the engine reports no features.
    if let Err(err) = poller.wait_for_configuration() {
        eprintln!("failed to load datafile: {}", err);
        return;
    }

    let context = UserContext::new("test-user", [("country".to_owned(), "nz".into())]);
    let client = client.with_context(context.clone());

    for feature in client.list_features().unwrap_or_default() {
        match client.get_and_track_feature_with_context(&feature.key, &context) {
            Ok(decision) => println!(
                "{}: enabled={} variables={:?}",
                feature.key, decision.enabled, decision.variables
            ),
            Err(err) => println!("{}: {}", feature.key, err),
        }
    }

    if let Ok(Some(decision)) = client.get_feature_for_user("basic") {
        println!("basic for attached user: enabled={}", decision.enabled);
    }

    let _ = poller.shutdown();
}
