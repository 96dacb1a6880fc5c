use ad_batch::config::batch_file::BatchFile;
use ad_batch::domain::model::{MediaKind, MediaPayload};
use ad_batch::domain::ports::Storage;
use ad_batch::utils::validation::Validate;
use ad_batch::{plan, LocalStorage};
use tempfile::TempDir;

const BATCH: &str = r#"
[batch]
access_token = "token"
template_ad_id = "111"
new_ad_set_name = "Autumn"

[defaults]
primary_text = "Fresh picks"
headline = "Shop autumn"
url = "https://example.com/autumn"

[assets]
directory = "creatives"
"#;

fn write_creatives(root: &std::path::Path) {
    let creatives = root.join("creatives");
    std::fs::create_dir_all(&creatives).unwrap();
    std::fs::write(creatives.join("leaves_9x16.mp4"), [0, 0, 0, 24]).unwrap();
    std::fs::write(creatives.join("leaves_4x5.jpg"), [1, 2]).unwrap();
    std::fs::write(creatives.join("pumpkin-1x1.png"), [3]).unwrap();
    std::fs::write(creatives.join(".DS_Store"), [9]).unwrap();
}

#[test]
fn test_batch_file_to_plan() {
    let temp_dir = TempDir::new().unwrap();
    write_creatives(temp_dir.path());
    let batch_path = temp_dir.path().join("autumn.toml");
    std::fs::write(&batch_path, BATCH).unwrap();

    let batch_file = BatchFile::from_file(&batch_path).unwrap();
    batch_file.validate_config().unwrap();

    let root = batch_file.assets_root(&batch_path).unwrap();
    let storage = LocalStorage::new(root.to_str().unwrap().to_string());
    let request = tokio_test::block_on(batch_file.into_request(&storage)).unwrap();
    request.validate().unwrap();

    assert_eq!(request.ads.len(), 2);
    let leaves = &request.ads[0];
    assert_eq!(leaves.ad_name, "leaves");
    assert_eq!(leaves.headline, "Shop autumn");
    assert_eq!(leaves.media.len(), 2);
    assert!(leaves
        .media
        .iter()
        .all(|m| matches!(m.payload, Some(MediaPayload::Inline(_)))));

    let planned = plan(&request);
    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0].group_key, "leaves");
    assert_eq!(planned[0].media_count, 2);
    assert_eq!(planned[1].group_key, "pumpkin");
    assert_eq!(request.ads[1].media[0].kind, MediaKind::Image);
}

#[tokio::test]
async fn test_result_is_written_through_storage() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let result = ad_batch::BatchCreateResult {
        ad_set_id: "set_1".to_string(),
        ad_set_name: "Autumn".to_string(),
        results: vec![
            ad_batch::AdResult::succeeded("leaves", "ad_1"),
            ad_batch::AdResult::failed("pumpkin", "Image too small"),
        ],
    };
    let body = serde_json::to_vec_pretty(&result).unwrap();
    storage.write_file("out/result.json", &body).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_slice(&storage.read_file("out/result.json").await.unwrap()).unwrap();
    assert_eq!(written["adSetId"], "set_1");
    assert_eq!(written["results"][0]["adId"], "ad_1");
    assert_eq!(written["results"][1]["success"], false);
    assert!(written["results"][1].get("adId").is_none());
}
