mod common;

use common::{setup, BASE_URL, PNG};
use doc_verifier::entities::document_signer;
use doc_verifier::models::document::{NewDocument, SignerSelection};
use doc_verifier::models::signer::{LinkItem, NewSigner, SignerUpdate};
use doc_verifier::services::storage::IncomingFile;
use doc_verifier::AppError;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

fn photo() -> IncomingFile {
    IncomingFile::new("budi.png", PNG)
}

#[tokio::test]
async fn create_stores_photo_and_links() {
    let app = setup().await;

    let view = app
        .state
        .signers
        .create(NewSigner {
            nama: "  Budi Santoso ".to_string(),
            jabatan: Some("Kepala Dinas".to_string()),
            bio: Some("   ".to_string()),
            links: Some(json!([{"label": "Profil", "url": "https://example.org/budi"}, "https://linkedin.com/in/budi"])),
            photo: Some(photo()),
        })
        .await
        .unwrap();

    assert_eq!(view.nama, "Budi Santoso");
    assert_eq!(view.bio, None);
    let photo_name = view.photo.clone().expect("photo stored");
    assert_eq!(app.stored_photos(), vec![photo_name.clone()]);
    assert_eq!(
        view.foto_url,
        Some(format!("{BASE_URL}/files/signers/{photo_name}"))
    );
    assert_eq!(
        view.links,
        vec![
            LinkItem { label: "Profil".into(), url: "https://example.org/budi".into() },
            LinkItem { label: "Linkedin.com".into(), url: "https://linkedin.com/in/budi".into() },
        ]
    );
}

#[tokio::test]
async fn create_validates_name_links_and_photo() {
    let app = setup().await;

    let err = app
        .state
        .signers
        .create(NewSigner { nama: " ".into(), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "name required"));

    let err = app
        .state
        .signers
        .create(NewSigner {
            nama: "Budi".into(),
            links: Some(json!({"url": "https://x"})),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "links must be a JSON array"));

    let err = app
        .state
        .signers
        .create(NewSigner {
            nama: "Budi".into(),
            photo: Some(IncomingFile::new("budi.gif", &b"GIF89a"[..])),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(app.stored_photos().is_empty());
}

#[tokio::test]
async fn update_replaces_and_removes_photos() {
    let app = setup().await;
    let signers = &app.state.signers;

    let created = signers
        .create(NewSigner {
            nama: "Budi".into(),
            jabatan: Some("Sekretaris".into()),
            photo: Some(photo()),
            ..Default::default()
        })
        .await
        .unwrap();
    let first_photo = created.photo.clone().unwrap();

    let replaced = signers
        .update(
            created.id,
            SignerUpdate {
                nama: "Budi".into(),
                photo: Some(IncomingFile::new("baru.png", PNG)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second_photo = replaced.photo.clone().unwrap();
    assert_ne!(first_photo, second_photo);
    assert_eq!(replaced.jabatan.as_deref(), Some("Sekretaris"));
    assert_eq!(app.stored_photos(), vec![second_photo]);

    let cleared = signers
        .update(
            created.id,
            SignerUpdate {
                nama: "Budi S.".into(),
                jabatan: Some(String::new()),
                remove_photo: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.nama, "Budi S.");
    assert_eq!(cleared.jabatan, None);
    assert_eq!(cleared.photo, None);
    assert_eq!(cleared.foto_url, None);
    assert!(app.stored_photos().is_empty());

    let err = signers
        .update(999, SignerUpdate { nama: "X".into(), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_detaches_signer_from_documents() {
    let app = setup().await;
    let keep = app.seed_signer("Ani").await;
    let gone = app
        .state
        .signers
        .create(NewSigner {
            nama: "Budi".into(),
            photo: Some(photo()),
            ..Default::default()
        })
        .await
        .unwrap();

    let document = app
        .state
        .documents
        .create(NewDocument {
            number: "SK/020/2024".into(),
            title: "Surat".into(),
            signers: SignerSelection::new([keep.id as i64, gone.id as i64]),
            files: vec![],
        })
        .await
        .unwrap();
    assert_eq!(document.signers.len(), 2);

    app.state.signers.delete(gone.id).await.unwrap();

    assert_eq!(document_signer::Entity::find().count(app.db()).await.unwrap(), 1);
    let after = app.state.queries.get_document(document.id).await.unwrap();
    assert_eq!(after.signer_names, vec!["Ani"]);
    assert!(app.stored_photos().is_empty());

    let err = app.state.signers.delete(gone.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
