use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lore_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lore");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create test documents
    let pages_dir = root.join("pages");
    fs::create_dir_all(&pages_dir).unwrap();
    fs::write(
        pages_dir.join("jon_snow.txt"),
        "Title: Jon Snow\n\nJon Snow is the bastard son of Eddard Stark, raised at Winterfell.\n\nHe joined the Night's Watch and rose to Lord Commander during the war.",
    ).unwrap();
    fs::write(
        pages_dir.join("winterfell.txt"),
        "Title: Winterfell\n\nWinterfell is the ancient seat of House Stark in the North.",
    )
    .unwrap();
    fs::write(
        pages_dir.join("house_stark.txt"),
        "Title: House Stark\n\nHouse Stark of Winterfell rules the North because the Kings of Winter once did.",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/lore.sqlite"

[retrieval]
max_documents = 5
max_context_chars = 4000

[generator]
provider = "rule-based"

[server]
bind = "127.0.0.1:7410"
"#,
        root.display()
    );

    let config_path = config_dir.join("lore.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lore(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lore_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lore binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn pages_dir(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("pages")
        .display()
        .to_string()
}

const NO_INFO_RESPONSES: [&str; 6] = [
    "I don't have enough information about that in my Game of Thrones knowledge.",
    "That doesn't appear in my records of Westeros and Essos.",
    "The maesters haven't recorded that information in my archives.",
    "I don't know about that aspect of Game of Thrones. Would you like to ask about one of the main characters or houses instead?",
    "My knowledge of the Seven Kingdoms doesn't include that information.",
    "Even the Spider's little birds haven't whispered that to me yet.",
];

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lore(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lore(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lore(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_directory() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);

    let (stdout, stderr, success) =
        run_lore(&config_path, &["import", &pages_dir(&config_path)]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents upserted: 3"));
    assert!(stdout.contains("ok"));
    // The entity index is rebuilt after the import completes.
    assert!(stdout.contains("1 characters"));
    assert!(stdout.contains("1 houses"));
    assert!(stdout.contains("1 locations"));
}

#[test]
fn test_import_idempotent_no_duplicates() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);

    let dir = pages_dir(&config_path);
    run_lore(&config_path, &["import", &dir]);
    let (stdout, _, success) = run_lore(&config_path, &["import", &dir]);
    assert!(success);
    assert!(stdout.contains("documents upserted: 3"));

    let (stats, _, _) = run_lore(&config_path, &["stats"]);
    assert!(stats.contains("documents: 3"), "stats: {}", stats);
}

#[test]
fn test_search_ranks_and_excerpts() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);
    run_lore(&config_path, &["import", &pages_dir(&config_path)]);

    let (stdout, stderr, success) = run_lore(&config_path, &["search", "Jon Snow"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Jon Snow"));
    assert!(stdout.contains("excerpt:"));
    // The matching page outranks the ones that merely mention related terms.
    let jon = stdout.find("1. ").unwrap();
    assert!(stdout[jon..].starts_with("1. ") && stdout.contains("] Jon Snow"));
}

#[test]
fn test_search_empty_store_no_results() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);

    let (stdout, _, success) = run_lore(&config_path, &["search", "dragons"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_ask_answers_from_context() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);
    run_lore(&config_path, &["import", &pages_dir(&config_path)]);

    let (stdout, stderr, success) = run_lore(&config_path, &["ask", "Who is Jon Snow?"]);
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Based on the Game of Thrones lore about Jon Snow,"));
    assert!(stdout.contains("(Using rule-based response system - No LLM configured)"));
}

#[test]
fn test_ask_empty_store_gives_no_info_phrase() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);

    let (stdout, _, success) = run_lore(&config_path, &["ask", "Who is Jon Snow?"]);
    assert!(success);
    assert!(
        NO_INFO_RESPONSES.iter().any(|r| stdout.contains(r)),
        "expected a no-info phrase, got: {}",
        stdout
    );
}

#[test]
fn test_classification_precedence_end_to_end() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);
    run_lore(&config_path, &["import", &pages_dir(&config_path)]);

    // Contains both "who" and "why": must route to the about-branch.
    let (stdout, _, success) = run_lore(
        &config_path,
        &["ask", "Who is the father of Jon Snow and why did he hide it?"],
    );
    assert!(success);
    assert!(
        stdout.contains("Based on the Game of Thrones lore about"),
        "expected about-response, got: {}",
        stdout
    );
}

#[test]
fn test_stats_on_populated_store() {
    let (_tmp, config_path) = setup_test_env();
    run_lore(&config_path, &["init"]);
    run_lore(&config_path, &["import", &pages_dir(&config_path)]);

    let (stdout, _, success) = run_lore(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("documents: 3"));
    assert!(stdout.contains("characters: 1"));
    assert!(stdout.contains("houses: 1"));
    assert!(stdout.contains("locations: 1"));
    assert!(stdout.contains("sample titles:"));
}

#[test]
fn test_missing_config_fails() {
    let (stdout, stderr, success) = run_lore(Path::new("/nonexistent/lore.toml"), &["stats"]);
    assert!(!success, "stats should fail without config: {}", stdout);
    assert!(stderr.contains("Failed to read config file"));
}
