mod common;

use common::{pdf, setup, BASE_URL};
use doc_verifier::entities::signer;
use doc_verifier::models::document::{NewDocument, SignerSelection};
use doc_verifier::models::signer::LinkItem;
use doc_verifier::pagination::Pagination;
use doc_verifier::AppError;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

fn new_document(number: &str, signer: i32) -> NewDocument {
    NewDocument {
        number: number.to_string(),
        title: format!("Dokumen {number}"),
        signers: SignerSelection::new([signer as i64]),
        files: vec![pdf("scan.pdf")],
    }
}

#[tokio::test]
async fn verification_is_case_insensitive_and_repeatable() {
    let app = setup().await;
    let signer = app.seed_signer("Budi").await;
    app.state.documents.create(new_document("SK/001/2024", signer.id)).await.unwrap();

    let first = app.state.queries.verify_by_number(" sk/001/2024 ").await.unwrap();
    let second = app.state.queries.verify_by_number("SK/001/2024").await.unwrap();

    let first = first.expect("document should verify");
    assert_eq!(first.nomor_dokumen, "SK/001/2024");
    assert_eq!(first.signer_names, vec!["Budi"]);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second.unwrap()).unwrap()
    );
}

#[tokio::test]
async fn unknown_or_blank_numbers_are_not_found() {
    let app = setup().await;
    let signer = app.seed_signer("Budi").await;
    app.state.documents.create(new_document("SK/001/2024", signer.id)).await.unwrap();

    assert!(app.state.queries.verify_by_number("SK/999").await.unwrap().is_none());
    assert!(app.state.queries.verify_by_number("   ").await.unwrap().is_none());
}

#[tokio::test]
async fn documents_are_listed_newest_first_with_optional_window() {
    let app = setup().await;
    let signer = app.seed_signer("Budi").await;
    for number in ["A", "B", "C"] {
        app.state.documents.create(new_document(number, signer.id)).await.unwrap();
    }

    let all = app.state.queries.list_documents(&Pagination::default()).await.unwrap();
    let numbers: Vec<_> = all.iter().map(|d| d.nomor_dokumen.as_str()).collect();
    assert_eq!(numbers, vec!["C", "B", "A"]);
    assert!(all.iter().all(|d| d.files.len() == 1 && d.signers.len() == 1));

    let page = |page, limit| Pagination {
        page: Some(page),
        limit: Some(limit),
    };
    let first = app.state.queries.list_documents(&page(1, 2)).await.unwrap();
    let second = app.state.queries.list_documents(&page(2, 2)).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].nomor_dokumen, "A");
}

#[tokio::test]
async fn get_document_reports_missing_ids() {
    let app = setup().await;
    let err = app.state.queries.get_document(42).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn signers_are_sorted_and_resolved_by_id_or_name() {
    let app = setup().await;
    let zaki = app.seed_signer("Zaki").await;
    let ani = app.seed_signer("Ani").await;
    let _ani_again = app.seed_signer("Ani").await;

    let names: Vec<_> = app
        .state
        .queries
        .list_signers()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.nama)
        .collect();
    assert_eq!(names, vec!["Ani", "Ani", "Zaki"]);

    let by_id = app.state.queries.get_signer(&zaki.id.to_string()).await.unwrap();
    assert_eq!(by_id.nama, "Zaki");

    let by_name = app.state.queries.get_signer("Ani").await.unwrap();
    assert_eq!(by_name.id, ani.id);

    assert!(matches!(
        app.state.queries.get_signer("Nobody").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn numeric_names_resolve_when_no_id_matches() {
    let app = setup().await;
    let first = app.seed_signer("Pertama").await;
    let numeric = app.seed_signer("2024").await;

    let by_id = app.state.queries.get_signer(&first.id.to_string()).await.unwrap();
    assert_eq!(by_id.nama, "Pertama");

    let by_name = app.state.queries.get_signer("2024").await.unwrap();
    assert_eq!(by_name.id, numeric.id);

    assert!(matches!(
        app.state.queries.get_signer("99999").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn signer_links_and_photo_url_are_normalized() {
    let app = setup().await;
    let seeded = app
        .seed_signer_with(
            "Budi",
            Some("Ketua"),
            Some(r#"[{"label":"X","url":"http://x"},"http://bare.example",{"label":"no url"}]"#),
        )
        .await;

    let mut active: signer::ActiveModel = seeded.clone().into();
    active.photo = Set(Some("budi_1700000000_0_deadbeef.png".to_string()));
    active.update(app.db()).await.unwrap();

    let view = app.state.queries.get_signer(&seeded.id.to_string()).await.unwrap();
    assert_eq!(
        view.links,
        vec![
            LinkItem { label: "X".into(), url: "http://x".into() },
            LinkItem { label: "Bare.example".into(), url: "http://bare.example".into() },
        ]
    );
    assert_eq!(
        view.foto_url.as_deref(),
        Some(format!("{BASE_URL}/files/signers/budi_1700000000_0_deadbeef.png").as_str())
    );

    let mut broken: signer::ActiveModel = signer::Entity::find_by_id(seeded.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap()
        .into();
    broken.links_json = Set(Some("not json".to_string()));
    broken.update(app.db()).await.unwrap();

    let view = app.state.queries.get_signer("Budi").await.unwrap();
    assert!(view.links.is_empty());
}

#[tokio::test]
async fn per_document_role_overrides_global_role() {
    let app = setup().await;
    let budi = app.seed_signer_with("Budi", Some("Sekretaris"), None).await;

    let view = app
        .state
        .documents
        .create(NewDocument {
            signers: SignerSelection::new([budi.id as i64]).with_role(budi.id as i64, "Ketua Panitia"),
            ..new_document("SK/011/2024", budi.id)
        })
        .await
        .unwrap();
    assert_eq!(view.signers[0].jabatan.as_deref(), Some("Ketua Panitia"));

    let global = app.state.queries.get_signer("Budi").await.unwrap();
    assert_eq!(global.jabatan.as_deref(), Some("Sekretaris"));
}
