//! Integration tests for the cgsh demo shell.

use std::io::Write;

use command_graph::shell::{OutputFormat, Shell, ShellConfig};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
prompt = "> "
source = "guest"

[sources.guest]
permissions = ["team.use", "team.invite"]
muted = true

[sources.admin]
permissions = ["*"]
"#;

fn config() -> ShellConfig {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    ShellConfig::load_from_file(file.path()).unwrap()
}

fn shell(source: Option<&str>) -> Shell {
    Shell::new(&config(), source, OutputFormat::Text).unwrap()
}

async fn run(shell: &Shell, script: &str, interactive: bool) -> String {
    let mut output = Vec::new();
    shell
        .run(script.as_bytes(), &mut output, interactive)
        .await
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_default_source_from_config() {
    assert_eq!(shell(None).source().name(), "guest");
    assert_eq!(shell(Some("admin")).source().name(), "admin");
}

#[test]
fn test_guest_permissions() {
    let guest = shell(None);

    let report = guest.execute("team invite Bob --role officer");
    assert!(report.ok);
    assert_eq!(report.replies, vec!["Invited Bob to the team as officer"]);

    let report = guest.execute("kick Bob");
    assert!(!report.ok);
    assert_eq!(report.category.as_deref(), Some("Authorization Error"));
    assert_eq!(report.error.as_deref(), Some("Missing permissions: admin.kick"));
}

#[test]
fn test_muted_source_cannot_say() {
    let report = shell(None).execute("say hello there");
    assert_eq!(
        report.error.as_deref(),
        Some("Condition 'not-muted' is not fulfilled")
    );

    let report = shell(Some("admin")).execute("say hello   there");
    assert_eq!(report.replies, vec!["[admin] hello there"]);
}

#[test]
fn test_kick_with_quoted_reason() {
    let admin = shell(Some("admin"));

    let report = admin.execute(r#"kick Bob --reason "too much spam""#);
    assert_eq!(report.replies, vec!["Kicked Bob: too much spam"]);

    let report = admin.execute("kick Bob -s");
    assert_eq!(report.replies, vec!["Kicked Bob silently"]);

    let report = admin.execute("kick admin");
    assert_eq!(report.category.as_deref(), Some("Invocation Error"));
    assert_eq!(
        report.error.as_deref(),
        Some("Command failed: admin cannot kick themselves")
    );
}

#[test]
fn test_math() {
    let admin = shell(Some("admin"));
    assert_eq!(admin.execute("math add 2 -5").replies, vec!["-3"]);
    assert_eq!(admin.execute("m div 9 2").replies, vec!["4"]);

    let report = admin.execute("math div 1 0");
    assert_eq!(
        report.error.as_deref(),
        Some("Command failed: division by zero")
    );

    let report = admin.execute("math add one 2");
    assert_eq!(report.category.as_deref(), Some("Argument Error"));
    assert_eq!(report.error.as_deref(), Some("'one' is not a valid number"));
}

#[test]
fn test_team_info_alias() {
    let report = shell(None).execute("t info -v");
    assert_eq!(report.replies, vec!["Team of guest: 1 member", "  guest (leader)"]);
}

#[tokio::test]
async fn test_run_script() {
    let shell = shell(Some("admin"));
    let output = run(
        &shell,
        "greet Alice --loud\n\n?team in\nteam info --verbose --verbose\nexit\ngreet Bob\n",
        false,
    )
    .await;

    assert_eq!(
        output,
        "HELLO, ALICE!\n\
         invite  info\n\
         Argument Error: Flag '--verbose' was supplied more than once\n"
    );
}

#[tokio::test]
async fn test_run_interactive_prints_prompt() {
    let shell = shell(None);
    let output = run(&shell, "hi Ann\n", true).await;
    assert_eq!(output, "> Hello, Ann!\n> ");
}

#[tokio::test]
async fn test_run_json_output() {
    let shell = Shell::new(&config(), Some("admin"), OutputFormat::Json).unwrap();
    let output = run(&shell, "greet\n?greet Ann -\n", false).await;

    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["ok"], false);
    assert_eq!(lines[0]["category"], "Syntax Error");
    assert_eq!(lines[1]["completions"], serde_json::json!(["--loud", "-l"]));
}
