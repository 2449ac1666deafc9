use super::*;
use crate::publish::guard::PublishState;

struct FailingUploader;

impl ContentUploader for FailingUploader {
    fn upload_directory(&self, _files: &[UploadFile]) -> ArtResult<String> {
        Err(ArtError::collaborator("storage unavailable"))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<BTreeMap<String, String>>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, params: &BTreeMap<String, String>) -> ArtResult<()> {
        self.sent.lock().unwrap().push(params.clone());
        Ok(())
    }
}

fn job(token_id: u64) -> PublishJob {
    PublishJob {
        token_id,
        signer_name: "Test User".to_string(),
        date: "January 1, 2025".to_string(),
        tx_hash: "0xfeed".to_string(),
        png: b"\x89PNG fake".to_vec(),
    }
}

fn zine() -> ZineRequest {
    ZineRequest {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        address1: "1 Main St".to_string(),
        address2: Some("Apt 2".to_string()),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62701".to_string(),
    }
}

#[test]
fn publish_uploads_image_then_metadata_then_sets_uri() {
    let uploader = Arc::new(MemoryUploader::new());
    let contract = Arc::new(MemoryContract::new());
    let id = contract.mint("0xwallet", 1_735_689_600).unwrap();
    let publisher = Publisher::new(uploader.clone(), contract.clone());
    let guard = PublishGuard::new();

    let PublishOutcome::Published {
        image_cid,
        metadata_cid,
        token_uri,
    } = publisher.publish(&guard, &job(id)).unwrap()
    else {
        panic!("expected a publish");
    };
    assert_eq!(uploader.directory_count(), 2);
    assert_eq!(
        uploader.get(&image_cid, "artwork.png").unwrap(),
        b"\x89PNG fake".to_vec()
    );
    let meta: TokenMetadata =
        serde_json::from_slice(&uploader.get(&metadata_cid, "metadata.json").unwrap()).unwrap();
    assert_eq!(meta.image, format!("ipfs://{image_cid}/artwork.png"));
    assert_eq!(token_uri, format!("ipfs://{metadata_cid}/metadata.json"));
    assert_eq!(contract.token_uri(id).unwrap(), token_uri);
    assert_eq!(guard.state(), PublishState::Done);
}

#[test]
fn publish_runs_at_most_once_per_guard() {
    let uploader = Arc::new(MemoryUploader::new());
    let contract = Arc::new(MemoryContract::new());
    let id = contract.mint("0xwallet", 0).unwrap();
    let publisher = Publisher::new(uploader.clone(), contract);
    let guard = PublishGuard::new();

    assert!(matches!(
        publisher.publish(&guard, &job(id)).unwrap(),
        PublishOutcome::Published { .. }
    ));
    assert_eq!(
        publisher.publish(&guard, &job(id)).unwrap(),
        PublishOutcome::Skipped
    );
    assert_eq!(uploader.directory_count(), 2);
}

#[test]
fn failures_are_non_fatal_and_reset_the_guard() {
    let contract = Arc::new(MemoryContract::new());
    let id = contract.mint("0xwallet", 0).unwrap();
    let publisher = Publisher::new(Arc::new(FailingUploader), contract.clone());
    let guard = PublishGuard::new();

    let err = publisher.publish(&guard, &job(id)).unwrap_err();
    assert!(matches!(err, ArtError::Collaborator(_)));
    assert!(!err.is_fatal());
    assert_eq!(guard.state(), PublishState::Idle);
    assert_eq!(contract.token_uri(id).unwrap(), "");
}

#[test]
fn unknown_token_fails_as_collaborator_error() {
    let publisher = Publisher::new(
        Arc::new(MemoryUploader::new()),
        Arc::new(MemoryContract::new()),
    );
    let err = publisher
        .publish(&PublishGuard::new(), &job(99))
        .unwrap_err();
    assert!(matches!(err, ArtError::Collaborator(_)));
}

#[test]
fn signing_details_come_from_the_contract() {
    let contract = Arc::new(MemoryContract::new());
    let id = contract.mint("0xwallet", 1_735_689_600).unwrap();
    assert_eq!(id, 1);
    assert_eq!(contract.owner_of(id).unwrap(), "0xwallet");
    let publisher = Publisher::new(Arc::new(MemoryUploader::new()), contract);
    let (date, signer) = publisher.signing_details(id).unwrap();
    assert_eq!(date, "January 1, 2025");
    assert_eq!(signer, "0xwallet");
}

#[test]
fn content_ids_are_deterministic() {
    let up = MemoryUploader::new();
    let file = UploadFile {
        name: "a.txt".to_string(),
        content_type: "text/plain",
        bytes: vec![1, 2, 3],
    };
    let a = up.upload_directory(std::slice::from_ref(&file)).unwrap();
    let b = up.upload_directory(&[file]).unwrap();
    assert_eq!(a, b);
    assert!(up.upload_directory(&[]).is_err());
}

#[test]
fn zine_requires_all_but_address2() {
    assert!(zine().validate().is_ok());
    let mut z = zine();
    z.address2 = None;
    assert!(z.validate().is_ok());

    let mut z = zine();
    z.city.clear();
    z.zip = " ".to_string();
    let msg = z.validate().unwrap_err().to_string();
    assert!(msg.contains("city") && msg.contains("zip"));

    let mut z = zine();
    z.email = "nope".to_string();
    assert!(matches!(z.validate(), Err(ArtError::Validation(_))));
}

#[test]
fn zine_submission_sends_template_params() {
    let notifier = RecordingNotifier::default();
    submit_zine(&notifier, &zine()).unwrap();
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["address"], "1 Main St, Apt 2");
    assert_eq!(sent[0]["from_email"], "ada@example.com");

    assert!(submit_zine(&notifier, &ZineRequest::default()).is_err());
    assert!(LogNotifier.send(&sent[0]).is_ok());
}
