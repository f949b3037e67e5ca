// tests/common.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assessment_portal::{
    config::Config,
    models::response::RESPONSE_HEADERS,
    routes,
    sheets::{InMemorySheetStore, Table, google::SheetLocation},
    state::AppState,
};

pub const STUDENT_HEADERS: &[&str] = &[
    "Username",
    "Password",
    "Department",
    "RollNo",
    "Name",
    "Violations",
    "Submitted",
];

pub const QUESTION_HEADERS: &[&str] = &[
    "QID", "Department", "Question", "Option1", "Option2", "Option3", "Option4", "Answer",
];

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemorySheetStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.login_with(&self.client, username, password).await
    }

    pub async fn login_with(
        &self,
        client: &reqwest::Client,
        username: &str,
        password: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/"))
            .form(&[("Username", username), ("Password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn violation(&self) -> serde_json::Value {
        self.violation_with(&self.client).await
    }

    pub async fn violation_with(&self, client: &reqwest::Client) -> serde_json::Value {
        client
            .post(self.url("/violation"))
            .json(&serde_json::json!({ "reason": "Window blur" }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse violation json")
    }

    /// Cell of the roster row belonging to `username`.
    pub fn student_cell(&self, username: &str, column: &str) -> String {
        let grid = self.store.snapshot(Table::Students);
        let col = grid[0].iter().position(|h| h == column).unwrap();
        grid.iter()
            .skip(1)
            .find(|row| row[0] == username)
            .map(|row| row.get(col).cloned().unwrap_or_default())
            .unwrap()
    }

    pub fn responses(&self) -> Vec<Vec<String>> {
        self.store.snapshot(Table::Responses).into_iter().skip(1).collect()
    }
}

pub fn seeded_store() -> InMemorySheetStore {
    InMemorySheetStore::new()
        .with_table(
            Table::Students,
            STUDENT_HEADERS,
            &[
                &["alice", "alice-pw", "CSE", "R001", "Alice Anand", "0", "0"],
                &["bob", "bob-pw", "", "R002", "Bob Bose", "0", "0"],
                &["carol", "carol-pw", "ECE", "R003", "Carol Cruz", "0", "1"],
                &["dave", "dave-pw", "CSE", "R004", "Dave Das", "7", "0"],
            ],
        )
        .with_table(
            Table::Questions,
            QUESTION_HEADERS,
            &[
                &["Q1", "", "Capital of France?", "Paris", "Rome", "Oslo", "Bern", "Paris"],
                &["Q2", "Aptitude", "Next prime after 7?", "9", "11", "13", "15", "11"],
                &["Q3", "CSE", "Bits in a byte?", "8", "4", "16", "2", "8"],
                &["Q4", "ECE", "Unit of resistance?", "Ohm", "Volt", "Amp", "Watt", "Ohm"],
            ],
        )
        .with_table(Table::Responses, &RESPONSE_HEADERS, &[])
}

/// Spawns the app on a random port over an in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(seeded_store()).await
}

pub async fn spawn_app_with(store: InMemorySheetStore) -> TestApp {
    let store = Arc::new(store);

    let config = Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        sheets_api_base: "http://unused.invalid".to_string(),
        service_account_file: None,
        sheets_access_token: Some("unused".to_string()),
        students_sheet: SheetLocation::new("students", "Sheet1"),
        questions_sheet: SheetLocation::new("questions", "Sheet1"),
        responses_sheet: SheetLocation::new("responses", "Responses"),
        exam_duration_min: 90,
        max_violations: 5,
        session_ttl: Duration::from_secs(600),
        default_pool: "Aptitude".to_string(),
        secure_cookies: false,
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
    };

    let state = AppState::new(store.clone(), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: cookie_client(),
    }
}

/// Client with its own cookie jar, i.e. a separate browser.
pub fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}
