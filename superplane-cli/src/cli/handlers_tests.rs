use crate::cli::canvases::CanvasCommands;
use crate::cli::events::EventCommands;
use crate::cli::executions::ExecutionCommands;
use crate::cli::flags::PageArgs;
use crate::cli::queue::QueueCommands;
use crate::cli::secrets::SecretCommands;
use crate::cli::{dispatch, Commands};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use superplane_core::client::memory::MemoryCanvasApi;
use superplane_core::command::{BindOptions, GlobalOptions, Streams};
use superplane_core::config::{ConfigContext, ConfigStore, EnvOverrides};
use superplane_core::models::{
    CanvasEvent, EventReference, LocalSecretData, NodeExecution, QueueItem, Secret,
    SecretMetadata, SecretSpec,
};
use superplane_core::render::SharedBuffer;
use superplane_core::CliError;
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    store: ConfigStore,
    api: Arc<MemoryCanvasApi>,
}

impl Harness {
    fn new(api: MemoryCanvasApi) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store =
            ConfigStore::open_with_overrides(dir.path().join("superplane.yaml"), EnvOverrides::default())
                .unwrap();
        Self {
            dir,
            store,
            api: Arc::new(api),
        }
    }

    /// Harness with one connected context.
    fn connected(api: MemoryCanvasApi) -> Self {
        let harness = Self::new(api);
        harness
            .store
            .upsert_context(ConfigContext::new("http://localhost:8000", "Acme", "secret-token"))
            .unwrap();
        harness
    }

    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn run_with(
        &self,
        command: Commands,
        output: Option<&str>,
        input: &str,
    ) -> anyhow::Result<String> {
        let globals = GlobalOptions {
            output: output.map(str::to_string),
            ..GlobalOptions::default()
        };
        let options = BindOptions::for_store(&self.store).with_api(self.api.clone());
        let buffer = SharedBuffer::new();
        let streams = Streams {
            output: Box::new(buffer.clone()),
            input: Box::new(Cursor::new(input.as_bytes().to_vec())),
        };

        dispatch(command, &globals, &options, streams).await?;
        Ok(buffer.contents())
    }

    async fn run(&self, command: Commands) -> anyhow::Result<String> {
        self.run_with(command, None, "").await
    }
}

fn cli_error(err: &anyhow::Error) -> &CliError {
    err.downcast_ref::<CliError>()
        .unwrap_or_else(|| panic!("expected a CliError, got {:#}", err))
}

fn canvases(command: CanvasCommands) -> Commands {
    Commands::Canvases { command }
}

fn page() -> PageArgs {
    PageArgs {
        limit: 20,
        before: None,
    }
}

fn acme_user() -> MemoryCanvasApi {
    MemoryCanvasApi::new().with_user("u-1", "ada@example.com", Some(("org-1", "Acme")))
}

#[tokio::test]
async fn test_connect_saves_context_and_hides_token() {
    let harness = Harness::new(acme_user());

    let output = harness
        .run(Commands::Connect {
            base_url: "http://localhost:8000/".to_string(),
            api_token: "secret-token".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(output, "Connected to \"Acme\" (http://localhost:8000)\n");
    let current = harness.store.get_current_context().unwrap();
    assert_eq!(current.selector(), "http://localhost:8000/Acme");
    assert_eq!(current.api_token, "secret-token");
    assert_eq!(harness.api.calls(), vec!["me", "describe_organization org-1"]);
}

#[tokio::test]
async fn test_connect_json_output() {
    let harness = Harness::new(acme_user());

    let output = harness
        .run_with(
            Commands::Connect {
                base_url: "http://localhost:8000".to_string(),
                api_token: "secret-token".to_string(),
            },
            Some("json"),
            "",
        )
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["organization"], "Acme");
    assert_eq!(value["url"], "http://localhost:8000");
    assert!(!output.contains("secret-token"));
}

#[tokio::test]
async fn test_connect_failures() {
    let harness = Harness::new(MemoryCanvasApi::new());
    let err = harness
        .run(Commands::Connect {
            base_url: "http://localhost:8000".to_string(),
            api_token: "bad-token".to_string(),
        })
        .await
        .unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.starts_with("failed to authenticate with the provided token: "));
    assert!(!message.contains("bad-token"));
    assert!(harness.store.get_contexts().is_empty());

    let harness = Harness::new(MemoryCanvasApi::new().with_user("u-1", "ada@example.com", None));
    let err = harness
        .run(Commands::Connect {
            base_url: "http://localhost:8000".to_string(),
            api_token: "token".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::NotFound(_)));

    let err = harness
        .run(Commands::Connect {
            base_url: "http://localhost:8000".to_string(),
            api_token: "  ".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API token is required");
}

#[tokio::test]
async fn test_contexts_without_any_configured() {
    let harness = Harness::new(MemoryCanvasApi::new());

    let err = harness
        .run(Commands::Contexts { selector: None })
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::NotFound(_)));
}

#[tokio::test]
async fn test_contexts_json_lists_without_tokens() {
    let harness = Harness::connected(MemoryCanvasApi::new());
    harness
        .store
        .upsert_context(ConfigContext::new("http://b", "Beta", "beta-token"))
        .unwrap();

    let output = harness
        .run_with(Commands::Contexts { selector: None }, Some("json"), "")
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let contexts = value["contexts"].as_array().unwrap();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[1]["organization"], "Beta");
    assert_eq!(contexts[1]["current"], true);
    assert!(contexts[0].get("current").is_none());
    assert!(!output.contains("token"));
}

#[tokio::test]
async fn test_contexts_interactive_switch() {
    let harness = Harness::connected(MemoryCanvasApi::new());
    harness
        .store
        .upsert_context(ConfigContext::new("http://b", "Beta", "beta-token"))
        .unwrap();

    let output = harness
        .run_with(Commands::Contexts { selector: None }, None, "1\n")
        .await
        .unwrap();

    assert_eq!(
        output,
        "  1. Acme (http://localhost:8000/Acme)\n* 2. Beta (http://b/Beta)\nSelect a context number: Current context: \"Acme\" (http://localhost:8000)\n"
    );
    assert_eq!(
        harness.store.get_current_context().unwrap().organization,
        "Acme"
    );
}

#[tokio::test]
async fn test_contexts_switch_by_selector() {
    let harness = Harness::connected(MemoryCanvasApi::new());
    harness
        .store
        .upsert_context(ConfigContext::new("http://b", "Beta", "beta-token"))
        .unwrap();

    harness
        .run(Commands::Contexts {
            selector: Some("http://localhost:8000/Acme/".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(
        harness.store.get_current_context().unwrap().organization,
        "Acme"
    );

    let err = harness
        .run(Commands::Contexts {
            selector: Some("http://nowhere/Org".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::NotFound(_)));
}

#[tokio::test]
async fn test_whoami() {
    let harness = Harness::connected(acme_user());

    let output = harness.run(Commands::Whoami).await.unwrap();
    assert_eq!(output, "ID: u-1\nEmail: ada@example.com\nOrganization: org-1\n");

    let output = harness
        .run_with(Commands::Whoami, Some("yaml"), "")
        .await
        .unwrap();
    assert!(output.contains("email: ada@example.com"));
}

#[tokio::test]
async fn test_canvas_list_and_get_by_name() {
    let harness = Harness::connected(
        MemoryCanvasApi::new()
            .with_canvas("c-1", "deploy")
            .with_canvas("c-2", "release"),
    );

    let output = harness.run(canvases(CanvasCommands::List)).await.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("ID") && lines[0].contains("CREATED_AT"));
    assert!(lines[2].contains("c-2") && lines[2].contains("release"));

    let output = harness
        .run(canvases(CanvasCommands::Get {
            name_or_id: "release".to_string(),
        }))
        .await
        .unwrap();
    assert!(output.starts_with("ID: c-2\nName: release\n"));
    assert!(output.ends_with("Nodes: 0\nEdges: 0\n"));

    let err = harness
        .run(canvases(CanvasCommands::Get {
            name_or_id: "missing".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::NotFound(_)));
}

#[tokio::test]
async fn test_active_canvas_interactive_then_used_by_events() {
    let harness = Harness::connected(
        MemoryCanvasApi::new()
            .with_canvas("c-1", "deploy")
            .with_canvas("c-2", "release"),
    );

    let output = harness
        .run_with(canvases(CanvasCommands::Active { canvas_id: None }), None, "2\n")
        .await
        .unwrap();
    assert!(output.contains("  2. release (c-2)\n"));
    assert!(output.ends_with("Active canvas: c-2\n"));

    harness
        .run(Commands::Events {
            command: EventCommands::List {
                canvas_id: String::new(),
                node_id: String::new(),
                page: page(),
            },
        })
        .await
        .unwrap();
    assert!(harness
        .api
        .calls()
        .contains(&"list_canvas_events c-2".to_string()));

    let output = harness
        .run_with(canvases(CanvasCommands::Active { canvas_id: None }), None, "1\n")
        .await
        .unwrap();
    assert!(output.contains("* 2. release (c-2)\n"));
}

#[tokio::test]
async fn test_active_canvas_requires_text_for_prompt() {
    let harness = Harness::connected(MemoryCanvasApi::new().with_canvas("c-1", "deploy"));

    let err = harness
        .run_with(
            canvases(CanvasCommands::Active { canvas_id: None }),
            Some("json"),
            "1\n",
        )
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::Unsupported(_)));
    assert!(harness.api.calls().is_empty());

    let output = harness
        .run_with(
            canvases(CanvasCommands::Active {
                canvas_id: Some("c-1".to_string()),
            }),
            Some("json"),
            "",
        )
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["activeCanvas"], "c-1");
}

#[tokio::test]
async fn test_active_canvas_without_context() {
    let harness = Harness::new(MemoryCanvasApi::new().with_canvas("c-1", "deploy"));

    let err = harness
        .run(canvases(CanvasCommands::Active {
            canvas_id: Some("c-1".to_string()),
        }))
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::NotFound(_)));
}

#[tokio::test]
async fn test_canvas_create_arguments() {
    let harness = Harness::connected(MemoryCanvasApi::new());
    let file = harness.write_file(
        "canvas.yaml",
        "apiVersion: v1\nkind: Canvas\nmetadata:\n  name: from-file\n",
    );

    let err = harness
        .run(canvases(CanvasCommands::Create {
            name: Some("deploy".to_string()),
            file: Some(file.clone()),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "cannot use <canvas-name> together with --file");

    let err = harness
        .run(canvases(CanvasCommands::Create {
            name: None,
            file: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "either --file or <canvas-name> is required");

    let output = harness
        .run(canvases(CanvasCommands::Create {
            name: Some("deploy".to_string()),
            file: None,
        }))
        .await
        .unwrap();
    assert_eq!(output, "Canvas created: deploy (canvas-1)\n");

    harness
        .run(canvases(CanvasCommands::Create {
            name: None,
            file: Some(file),
        }))
        .await
        .unwrap();
    let names: Vec<String> = harness
        .api
        .canvases()
        .into_iter()
        .map(|canvas| canvas.metadata.name)
        .collect();
    assert_eq!(names, vec!["deploy", "from-file"]);
}

#[tokio::test]
async fn test_canvas_update_and_delete() {
    let harness = Harness::connected(MemoryCanvasApi::new().with_canvas("c-1", "deploy"));

    let without_id = harness.write_file(
        "no-id.yaml",
        "apiVersion: v1\nkind: Canvas\nmetadata:\n  name: deploy\n",
    );
    let err = harness
        .run(canvases(CanvasCommands::Update { file: without_id }))
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::Validation(_)));

    let with_id = harness.write_file(
        "with-id.yaml",
        "apiVersion: v1\nkind: Canvas\nmetadata:\n  id: c-1\n  name: renamed\n",
    );
    let output = harness
        .run(canvases(CanvasCommands::Update { file: with_id }))
        .await
        .unwrap();
    assert_eq!(output, "Canvas updated: c-1\n");
    assert_eq!(harness.api.canvases()[0].metadata.name, "renamed");

    let output = harness
        .run(canvases(CanvasCommands::Delete {
            canvas_id: "c-1".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(output, "Canvas deleted: c-1\n");
    assert!(harness.api.canvases().is_empty());
}

fn run_event() -> CanvasEvent {
    CanvasEvent {
        id: "e-1".to_string(),
        node_id: "trigger".to_string(),
        channel: "default".to_string(),
        executions: vec![NodeExecution {
            id: "x-1".to_string(),
            node_id: "build".to_string(),
            state: "STATE_FINISHED".to_string(),
            result: "RESULT_FAILED".to_string(),
            ..NodeExecution::default()
        }],
        ..CanvasEvent::default()
    }
}

#[tokio::test]
async fn test_events_list_and_executions() {
    let harness = Harness::connected(MemoryCanvasApi::new().with_event("c-1", run_event()));

    let output = harness
        .run(Commands::Events {
            command: EventCommands::List {
                canvas_id: "c-1".to_string(),
                node_id: String::new(),
                page: page(),
            },
        })
        .await
        .unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].contains("EXECUTIONS"));
    assert!(lines[1].contains("e-1") && lines[1].contains("trigger"));

    let output = harness
        .run(Commands::Events {
            command: EventCommands::ListExecutions {
                canvas_id: "c-1".to_string(),
                event_id: "e-1".to_string(),
            },
        })
        .await
        .unwrap();
    assert!(output.contains("x-1") && output.contains("RESULT_FAILED"));

    let output = harness
        .run(Commands::Executions {
            command: ExecutionCommands::List {
                canvas_id: "c-1".to_string(),
                node_id: "build".to_string(),
                page: page(),
            },
        })
        .await
        .unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].contains("MESSAGE"));
    let columns: Vec<&str> = lines[1].split_whitespace().collect();
    assert_eq!(columns, vec!["x-1", "build", "STATE_FINISHED", "RESULT_FAILED", "-"]);
}

#[tokio::test]
async fn test_events_invalid_before() {
    let harness = Harness::connected(MemoryCanvasApi::new());

    let err = harness
        .run(Commands::Events {
            command: EventCommands::List {
                canvas_id: "c-1".to_string(),
                node_id: "n-1".to_string(),
                page: PageArgs {
                    limit: 20,
                    before: Some("last week".to_string()),
                },
            },
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid --before value \"last week\": expected RFC3339 timestamp"
    );
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn test_commands_need_a_canvas() {
    let harness = Harness::connected(MemoryCanvasApi::new());

    let err = harness
        .run(Commands::Queue {
            command: QueueCommands::List {
                canvas_id: String::new(),
                node_id: "n-1".to_string(),
            },
        })
        .await
        .unwrap_err();
    assert!(matches!(cli_error(&err), CliError::Validation(_)));
    assert!(err.to_string().starts_with("canvas id is required"));
}

#[tokio::test]
async fn test_execution_cancel() {
    let harness = Harness::connected(MemoryCanvasApi::new());

    let output = harness
        .run(Commands::Executions {
            command: ExecutionCommands::Cancel {
                canvas_id: "c-1".to_string(),
                execution_id: "x-1".to_string(),
            },
        })
        .await
        .unwrap();
    assert_eq!(output, "Execution cancelled: x-1\n");
    assert_eq!(harness.api.cancelled_executions(), vec!["x-1"]);
}

#[tokio::test]
async fn test_queue_list_and_delete() {
    let item = QueueItem {
        id: "q-1".to_string(),
        created_at: None,
        root_event: Some(EventReference {
            id: "e-1".to_string(),
            node_id: "trigger".to_string(),
        }),
    };
    let harness =
        Harness::connected(MemoryCanvasApi::new().with_queue_item("c-1", "build", item));

    let output = harness
        .run(Commands::Queue {
            command: QueueCommands::List {
                canvas_id: "c-1".to_string(),
                node_id: "build".to_string(),
            },
        })
        .await
        .unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].contains("ROOT_EVENT_ID"));
    assert!(lines[1].contains("q-1") && lines[1].contains("e-1") && lines[1].contains("trigger"));

    let output = harness
        .run(Commands::Queue {
            command: QueueCommands::Delete {
                canvas_id: "c-1".to_string(),
                node_id: "build".to_string(),
                item_id: "q-1".to_string(),
            },
        })
        .await
        .unwrap();
    assert_eq!(output, "Queue item deleted: q-1\n");
    assert!(harness.api.queue_items("c-1", "build").is_empty());
}

fn api_keys_secret() -> Secret {
    Secret {
        metadata: SecretMetadata {
            id: Some("s-1".to_string()),
            name: "api-keys".to_string(),
            domain_id: Some("org-1".to_string()),
            ..SecretMetadata::default()
        },
        spec: SecretSpec {
            provider: "PROVIDER_LOCAL".to_string(),
            local: Some(LocalSecretData {
                data: [
                    ("zeta".to_string(), "value-z".to_string()),
                    ("alpha".to_string(), "value-a".to_string()),
                ]
                .into_iter()
                .collect(),
            }),
        },
    }
}

#[tokio::test]
async fn test_secret_get_never_prints_values() {
    let harness = Harness::connected(acme_user().with_secret(api_keys_secret()));

    let output = harness
        .run(Commands::Secrets {
            command: SecretCommands::Get {
                id_or_name: "api-keys".to_string(),
            },
        })
        .await
        .unwrap();
    assert!(output.starts_with("ID: s-1\nName: api-keys\nProvider: PROVIDER_LOCAL\n"));
    assert!(output.ends_with("Keys:\n- alpha\n- zeta\n"));
    assert!(!output.contains("value-"));

    for format in ["json", "yaml"] {
        let output = harness
            .run_with(
                Commands::Secrets {
                    command: SecretCommands::Get {
                        id_or_name: "s-1".to_string(),
                    },
                },
                Some(format),
                "",
            )
            .await
            .unwrap();
        assert!(output.contains("alpha"));
        assert!(!output.contains("value-"), "{}", output);
    }

    let output = harness
        .run_with(
            Commands::Secrets {
                command: SecretCommands::List,
            },
            Some("json"),
            "",
        )
        .await
        .unwrap();
    assert!(!output.contains("value-"));
    assert!(harness
        .api
        .calls()
        .contains(&"list_secrets org-1".to_string()));
}

#[tokio::test]
async fn test_secret_list_counts_keys() {
    let harness = Harness::connected(acme_user().with_secret(api_keys_secret()));

    let output = harness
        .run(Commands::Secrets {
            command: SecretCommands::List,
        })
        .await
        .unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].starts_with("ID  ") && lines[0].contains("KEYS"));
    let columns: Vec<&str> = lines[1].split_whitespace().collect();
    assert_eq!(columns, vec!["s-1", "api-keys", "PROVIDER_LOCAL", "2"]);
}

#[tokio::test]
async fn test_secret_create_update_delete() {
    let harness = Harness::connected(acme_user());
    let file = harness.write_file(
        "secret.yaml",
        "apiVersion: v1\nkind: Secret\nmetadata:\n  name: creds\nspec:\n  provider: PROVIDER_LOCAL\n  local:\n    data:\n      token: abc\n",
    );

    let output = harness
        .run(Commands::Secrets {
            command: SecretCommands::Create { file: file.clone() },
        })
        .await
        .unwrap();
    assert_eq!(output, "Secret created: creds (secret-1)\n");

    let output = harness
        .run(Commands::Secrets {
            command: SecretCommands::Update { file },
        })
        .await
        .unwrap();
    assert_eq!(output, "Secret updated: creds\n");

    let output = harness
        .run(Commands::Secrets {
            command: SecretCommands::Delete {
                id_or_name: "creds".to_string(),
            },
        })
        .await
        .unwrap();
    assert_eq!(output, "Secret deleted: creds\n");
    assert!(harness.api.secrets().is_empty());
}

#[tokio::test]
async fn test_secrets_need_an_organization() {
    let harness =
        Harness::connected(MemoryCanvasApi::new().with_user("u-1", "ada@example.com", None));

    let err = harness
        .run(Commands::Secrets {
            command: SecretCommands::List,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "organization id not found for authenticated user"
    );
}
