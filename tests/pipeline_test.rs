//! 主流程测试：使用内存中的 ShareApi，不访问网络

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use terabox_direct_link::terabox::{
    self, ListQuery, ResolveOptions, ShareApi, ShareIds, TransportError,
};
use terabox_direct_link::ResolveError;

const SHARE_URL: &str = "https://terabox.com/s/1abcDEF";
const PAGE: &str =
    r#"<script>window.globalData = {"share":{"uk":4400,"shareid":9900}};</script>"#;

#[derive(Default)]
struct Calls {
    pages: Vec<String>,
    lists: Vec<(Option<String>, String)>,
    downloads: Vec<u64>,
}

struct FakeApi {
    page: Result<String, TransportError>,
    /// key: 子目录路径，None 为根目录
    listings: HashMap<Option<String>, String>,
    downloads: HashMap<u64, Result<String, TransportError>>,
    delays: HashMap<u64, u64>,
    calls: Mutex<Calls>,
}

impl FakeApi {
    fn new(root_listing: &str) -> Self {
        let mut listings = HashMap::new();
        listings.insert(None, root_listing.to_string());
        Self {
            page: Ok(PAGE.to_string()),
            listings,
            downloads: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Calls::default()),
        }
    }

    fn with_dlink(mut self, fs_id: u64) -> Self {
        let body = format!(
            r#"{{"errno":0,"list":[{{"fs_id":{0},"dlink":"https://d.1024tera.com/file/{0}?sign=s"}}]}}"#,
            fs_id
        );
        self.downloads.insert(fs_id, Ok(body));
        self
    }

    fn with_download(mut self, fs_id: u64, resp: Result<String, TransportError>) -> Self {
        self.downloads.insert(fs_id, resp);
        self
    }

    fn with_listing(mut self, dir: &str, body: &str) -> Self {
        self.listings.insert(Some(dir.to_string()), body.to_string());
        self
    }

    fn with_delay(mut self, fs_id: u64, millis: u64) -> Self {
        self.delays.insert(fs_id, millis);
        self
    }

    fn with_page(mut self, page: Result<String, TransportError>) -> Self {
        self.page = page;
        self
    }

    fn page_calls(&self) -> usize {
        self.calls.lock().unwrap().pages.len()
    }

    fn list_calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().lists.clone()
    }

    fn download_calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().downloads.clone()
    }
}

#[async_trait]
impl ShareApi for FakeApi {
    async fn fetch_share_page(&self, share_url: &str) -> Result<String, TransportError> {
        self.calls.lock().unwrap().pages.push(share_url.to_string());
        self.page.clone()
    }

    async fn list_share(&self, query: &ListQuery<'_>) -> Result<String, TransportError> {
        assert_eq!(query.ids.uk, "4400");
        assert_eq!(query.ids.shareid, "9900");
        let dir = query.dir.map(str::to_string);
        self.calls
            .lock()
            .unwrap()
            .lists
            .push((dir.clone(), query.share_url.to_string()));
        self.listings
            .get(&dir)
            .cloned()
            .ok_or_else(|| TransportError::Status(404))
    }

    async fn share_download(&self, ids: &ShareIds, fs_id: u64) -> Result<String, TransportError> {
        assert_eq!(ids.shareid, "9900");
        self.calls.lock().unwrap().downloads.push(fs_id);
        if let Some(millis) = self.delays.get(&fs_id) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        self.downloads
            .get(&fs_id)
            .cloned()
            .unwrap_or_else(|| Ok(r#"{"errno":0,"list":[{"fs_id":0}]}"#.to_string()))
    }
}

fn opts(concurrency: usize, folder_depth: usize) -> ResolveOptions {
    ResolveOptions {
        concurrency,
        folder_depth,
    }
}

const THREE_FILES: &str = r#"{"errno":0,"list":[
    {"fs_id":11,"server_filename":"one.mp4","size":1536,"isdir":0,"path":"/one.mp4"},
    {"fs_id":12,"server_filename":"two.mkv","size":"1048576","isdir":0,"path":"/two.mkv"},
    {"fs_id":13,"server_filename":"three.zip","size":0,"isdir":0,"path":"/three.zip"}
]}"#;

#[tokio::test]
async fn test_resolves_all_files_in_listing_order() {
    let api = FakeApi::new(THREE_FILES)
        .with_dlink(11)
        .with_dlink(12)
        .with_dlink(13);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(1, 0))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.short_link, SHARE_URL);
    assert_eq!(result.item_count, 3);
    let ids: Vec<u64> = result.files.iter().map(|f| f.fs_id).collect();
    assert_eq!(ids, vec![11, 12, 13]);

    let first = &result.files[0];
    assert_eq!(first.title, "one.mp4");
    assert_eq!(first.size, "1.50 KB");
    assert_eq!(
        first.direct_link.as_deref(),
        Some("https://d.1024tera.com/file/11?sign=s")
    );
    assert_eq!(
        first.fast_link.as_deref(),
        Some("https://d8.freeterabox.com/file/11?sign=s")
    );
    assert_eq!(first.thumbnails, terabox::thumbnails(11));
    assert!(first.link_error.is_none());
    assert_eq!(result.files[1].size, "1.00 MB");
    assert_eq!(result.files[2].size, "0.00 B");

    assert_eq!(api.page_calls(), 1);
    assert_eq!(api.list_calls(), vec![(None, SHARE_URL.to_string())]);
    assert_eq!(api.download_calls(), vec![11, 12, 13]);
}

#[tokio::test]
async fn test_directories_are_not_resolved() {
    let listing = r#"{"errno":0,"list":[
        {"fs_id":21,"server_filename":"folder","size":0,"isdir":1,"path":"/folder"},
        {"fs_id":22,"server_filename":"clip.mp4","size":10,"isdir":0,"path":"/clip.mp4"}
    ]}"#;
    let api = FakeApi::new(listing).with_dlink(22);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(2, 0))
        .await
        .unwrap();

    assert_eq!(result.item_count, 1);
    assert_eq!(result.files[0].fs_id, 22);
    assert_eq!(api.download_calls(), vec![22]);
    assert_eq!(api.list_calls().len(), 1);
}

#[tokio::test]
async fn test_nested_folders_are_flattened() {
    let root = r#"{"errno":0,"list":[
        {"fs_id":1,"server_filename":"a.mp4","size":1,"isdir":0,"path":"/a.mp4"},
        {"fs_id":2,"server_filename":"season","size":0,"isdir":1,"path":"/season"},
        {"fs_id":3,"server_filename":"z.mp4","size":1,"isdir":0,"path":"/z.mp4"}
    ]}"#;
    let season = r#"{"errno":0,"list":[
        {"fs_id":4,"server_filename":"e01.mp4","size":1,"isdir":0,"path":"/season/e01.mp4"},
        {"fs_id":5,"server_filename":"extras","size":0,"isdir":1,"path":"/season/extras"}
    ]}"#;
    let extras = r#"{"errno":0,"list":[
        {"fs_id":6,"server_filename":"bts.mp4","size":1,"isdir":0,"path":"/season/extras/bts.mp4"}
    ]}"#;

    let api = FakeApi::new(root)
        .with_listing("/season", season)
        .with_listing("/season/extras", extras);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap();
    let ids: Vec<u64> = result.files.iter().map(|f| f.fs_id).collect();
    assert_eq!(ids, vec![1, 4, 6, 3]);
    assert_eq!(result.files[2].path, "/season/extras/bts.mp4");

    let dirs: Vec<Option<String>> = api.list_calls().into_iter().map(|(d, _)| d).collect();
    assert_eq!(
        dirs,
        vec![
            None,
            Some("/season".to_string()),
            Some("/season/extras".to_string())
        ]
    );

    // 深度 1 时只展开一层
    let api = FakeApi::new(root).with_listing("/season", season);
    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 1))
        .await
        .unwrap();
    let ids: Vec<u64> = result.files.iter().map(|f| f.fs_id).collect();
    assert_eq!(ids, vec![1, 4, 3]);
}

#[tokio::test]
async fn test_listing_errno_fails_without_downloads() {
    let api = FakeApi::new(r#"{"errno":-7,"list":[],"request_id":42}"#);

    let err = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap_err();

    match &err {
        ResolveError::ListingFailed { raw, .. } => {
            assert_eq!(raw["errno"], -7);
            assert_eq!(raw["request_id"], 42);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.raw().unwrap()["errno"], -7);
    assert!(api.download_calls().is_empty());
}

#[tokio::test]
async fn test_missing_dlink_only_affects_that_file() {
    let api = FakeApi::new(THREE_FILES)
        .with_dlink(11)
        .with_download(12, Ok(r#"{"errno":0,"list":[{"fs_id":12}]}"#.to_string()))
        .with_dlink(13);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(3, 0))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.item_count, 3);

    let broken = &result.files[1];
    assert!(broken.direct_link.is_none());
    assert!(broken.fast_link.is_none());
    assert!(broken.link_error.is_some());
    assert_eq!(broken.size, "1.00 MB");

    assert!(result.files[0].direct_link.is_some());
    assert!(result.files[2].fast_link.is_some());

    // 缺失的链接以 null 输出
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["files"][1]["direct_link"].is_null());
    assert!(json["files"][1]["fast_link"].is_null());
}

#[tokio::test]
async fn test_download_transport_errors_are_gaps() {
    let api = FakeApi::new(THREE_FILES)
        .with_download(11, Err(TransportError::Timeout))
        .with_download(12, Ok("<html>busy</html>".to_string()))
        .with_dlink(13);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(2, 0))
        .await
        .unwrap();

    assert!(result.files[0].direct_link.is_none());
    assert!(result.files[1].direct_link.is_none());
    assert!(result.files[2].direct_link.is_some());
    assert_ne!(result.files[0].link_error, result.files[1].link_error);
}

#[tokio::test]
async fn test_concurrent_resolution_keeps_order() {
    let api = FakeApi::new(THREE_FILES)
        .with_dlink(11)
        .with_dlink(12)
        .with_dlink(13)
        .with_delay(11, 60)
        .with_delay(12, 30);

    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(3, 0))
        .await
        .unwrap();

    let links: Vec<&str> = result
        .files
        .iter()
        .map(|f| f.direct_link.as_deref().unwrap())
        .collect();
    assert_eq!(
        links,
        vec![
            "https://d.1024tera.com/file/11?sign=s",
            "https://d.1024tera.com/file/12?sign=s",
            "https://d.1024tera.com/file/13?sign=s",
        ]
    );
}

#[tokio::test]
async fn test_unsupported_domain_makes_no_calls() {
    let api = FakeApi::new(THREE_FILES);

    let err = terabox::resolve_share(&api, Some("https://evil.example.com/s/1abc"), &opts(4, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedDomain { .. }));

    let err = terabox::resolve_share(&api, None, &opts(4, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::MissingUrl));

    assert_eq!(api.page_calls(), 0);
    assert!(api.list_calls().is_empty());
    assert!(api.download_calls().is_empty());
}

#[tokio::test]
async fn test_identifiers_not_found() {
    let api = FakeApi::new(THREE_FILES).with_page(Ok("<html>expired</html>".to_string()));

    let err = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::IdentifiersNotFound));
    assert!(api.list_calls().is_empty());
}

#[tokio::test]
async fn test_page_fetch_failures() {
    let api = FakeApi::new(THREE_FILES).with_page(Err(TransportError::Timeout));
    let err = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::IdentifiersNotFound));

    let api = FakeApi::new(THREE_FILES).with_page(Err(TransportError::Status(503)));
    let err = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Status(503))
    ));
    assert!(api.list_calls().is_empty());
}

#[tokio::test]
async fn test_empty_share() {
    let api = FakeApi::new(r#"{"errno":0,"list":[]}"#);
    let result = terabox::resolve_share(&api, Some(SHARE_URL), &opts(4, 3))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.item_count, 0);
    assert!(result.files.is_empty());
}

#[tokio::test]
async fn test_resolution_runs_on_spawned_task() {
    let root = r#"{"errno":0,"list":[
        {"fs_id":11,"server_filename":"one.mp4","size":1536,"isdir":0,"path":"/one.mp4"},
        {"fs_id":2,"server_filename":"season","size":0,"isdir":1,"path":"/season"}
    ]}"#;
    let season = r#"{"errno":0,"list":[
        {"fs_id":12,"server_filename":"e01.mp4","size":10,"isdir":0,"path":"/season/e01.mp4"}
    ]}"#;
    let api = Arc::new(
        FakeApi::new(root)
            .with_listing("/season", season)
            .with_dlink(11)
            .with_dlink(12),
    );

    // tokio::spawn 要求整条解析流程的 future 是 Send
    let task_api = Arc::clone(&api);
    let share_url = SHARE_URL.to_string();
    let handle = tokio::spawn(async move {
        terabox::resolve_share(task_api.as_ref(), Some(share_url.as_str()), &opts(2, 3)).await
    });

    let result = handle.await.unwrap().unwrap();
    let ids: Vec<u64> = result.files.iter().map(|f| f.fs_id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert!(result.files.iter().all(|f| f.direct_link.is_some()));
    assert_eq!(api.download_calls(), vec![11, 12]);
}
