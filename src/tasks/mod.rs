//! Built-in task registry
//!
//! Every development task is declared here as data: named step groups over
//! structured commands, prompts and collaborator operations. The external
//! tools (source control, dependency installer, application console, test
//! runner, vhost helper) are opaque commands configured through
//! [`Settings`].

use crate::config::{Settings, ADMIN_EMAIL_ENV, ADMIN_PASSWORD_ENV};
use crate::runner::{
    Action, CommandSpec, Orchestrator, PromptSpec, Step, StepGroup, Task, TaskParam, UserOp, When,
};

/// Register every built-in task; `version` is the default task
pub fn register_builtin_tasks(orch: &mut Orchestrator, settings: &Settings) {
    orch.register(version(settings));
    orch.register(migrate(settings));
    orch.register(update(settings));
    orch.register(setup());
    orch.register(setup_tests(settings));
    orch.register(run_tests(settings));
    orch.register(clear_assets(settings));
    orch.register(setup_admin_user(settings));
    orch.register(setup_docs(settings));
    orch.register(generate_docs(settings));
    orch.register(virtual_host(settings));
    orch.set_default("version");
}

fn cmd(settings: &Settings, argv: &[String], extra: &[&str]) -> CommandSpec {
    let mut full = argv.to_vec();
    full.extend(extra.iter().map(|a| a.to_string()));
    CommandSpec::from_argv(&full).timeout(settings.step_timeout())
}

fn console(settings: &Settings, extra: &[&str]) -> CommandSpec {
    cmd(settings, &settings.console, extra)
}

fn installer(settings: &Settings, extra: &[&str]) -> CommandSpec {
    cmd(settings, &settings.package_manager, extra)
}

fn subtask(label: &str, name: &str, overrides: &[(&str, &str)]) -> Step {
    Step::new(
        label,
        Action::Subtask {
            name: name.to_string(),
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        },
    )
}

/// Display the application version from source-control history
fn version(settings: &Settings) -> Task {
    Task::new("version", "Display application version from git describe").with_steps(vec![
        Step::new("banner", Action::Note("Application Version".to_string())),
        Step::new(
            "git describe",
            Action::Command(
                CommandSpec::new("git", &["describe"]).timeout(settings.step_timeout()),
            ),
        ),
    ])
}

/// Run pending data migrations against `${db}`
fn migrate(settings: &Settings) -> Task {
    Task::new("migrate", "Run pending database migrations")
        .param(
            TaskParam::option("db", "Target database component")
                .default_value("db"),
        )
        .with_steps(vec![Step::new(
            "migrate",
            Action::Command(console(
                settings,
                &["migrate", "--db=${db}", "--interactive=${interactive}"],
            )),
        )])
}

/// Update sources, install dependencies, migrate, clear cache
fn update(settings: &Settings) -> Task {
    Task::new(
        "update",
        "Update application and vendor source code, run migrations, clear cache",
    )
    .with_steps(vec![
        Step::new(
            "git pull",
            Action::Command(CommandSpec::new("git", &["pull"]).timeout(settings.step_timeout())),
        ),
        Step::new(
            "install dependencies",
            Action::Command(installer(settings, &["install"])),
        ),
        subtask("migrate", "migrate", &[]),
        Step::new(
            "flush cache",
            Action::Command(console(settings, &["cache/flush", "cache"])),
        ),
    ])
}

/// Initial application setup
fn setup() -> Task {
    Task::new("setup", "Initial application setup").with_steps(vec![
        subtask("migrate", "migrate", &[]),
        subtask("admin user", "setup-admin-user", &[]),
        subtask("virtual host", "virtual-host", &[]),
    ])
}

/// Install packages for application testing and build suite configs
fn setup_tests(settings: &Settings) -> Task {
    let mut steps = vec![
        subtask("migrate test db", "migrate", &[("db", "db_test")]),
        Step::new(
            "install global test tools",
            Action::Command(installer(
                settings,
                &[
                    "global",
                    "require",
                    "codeception/codeception:2.0.*",
                    "codeception/specify:*",
                    "codeception/verify:*",
                ],
            )),
        ),
        Step::new(
            "install dev test packages",
            Action::Command(installer(
                settings,
                &[
                    "require",
                    "--dev",
                    "yiisoft/yii2-coding-standards:2.*",
                    "yiisoft/yii2-codeception:2.*",
                    "yiisoft/yii2-faker:2.*",
                ],
            )),
        ),
    ];

    for suite in &settings.suites {
        let suite_config = settings.suite_config(suite);
        steps.push(Step::new(
            format!("build {} suite", suite),
            Action::Command(cmd(
                settings,
                &settings.test_runner,
                &["build", "-c", suite_config.as_str()],
            )),
        ));
    }

    Task::new("setup-tests", "Install packages for application testing").with_steps(steps)
}

/// Run every test suite against an ephemeral local web server
///
/// The suite phase runs all suites regardless of individual failures and
/// fails if any suite failed. The server is launched detached and stopped
/// when the run ends.
fn run_tests(settings: &Settings) -> Task {
    let prepare = vec![
        Step::new(
            "note",
            Action::Note(
                "Note! The test server is stopped automatically when the run ends.".to_string(),
            ),
        ),
        Step::new(
            "confirm",
            Action::Confirm {
                question: "Start testing?".to_string(),
                default: true,
            },
        ),
        Step::new(
            "start test server",
            Action::Command(CommandSpec::from_argv(&settings.server).detached()),
        ),
    ];

    let suites = settings
        .suites
        .iter()
        .map(|suite| {
            let suite_config = settings.suite_config(suite);
            Step::new(
                format!("run {} suite", suite),
                Action::Command(cmd(
                    settings,
                    &settings.test_runner,
                    &["run", "-c", suite_config.as_str()],
                )),
            )
        })
        .collect();

    Task::new("run-tests", "Run all test suites with a local web server")
        .group(StepGroup::abort_on_failure(prepare))
        .group(StepGroup::collect_failures(suites))
}

/// Remove hashed asset folders from one or both application areas
///
/// Areas are independent: a failing area is recorded but does not stop the
/// other, hence the collect policy.
fn clear_assets(settings: &Settings) -> Task {
    let steps = ["frontend", "backend"]
        .into_iter()
        .map(|area| {
            Step::new(
                format!("clear {} assets", area),
                Action::PurgeAssets {
                    dir: settings.assets_dir(area),
                },
            )
            .when(When::EqualOrUnset {
                var: "area".to_string(),
                value: area.to_string(),
            })
        })
        .collect();

    Task::new("clear-assets", "Clear published asset folders")
        .param(TaskParam::positional(
            "area",
            "frontend or backend; both when omitted",
        ))
        .group(StepGroup::collect_failures(steps))
}

/// Create or refresh the application admin account
fn setup_admin_user(settings: &Settings) -> Task {
    let admin = settings.admin_username.as_str();
    let absent = || When::equal("${admin_exists}", "false");
    let present = || When::equal("${admin_exists}", "true");

    Task::new(
        "setup-admin-user",
        "Setup admin user (create, update password, confirm)",
    )
    .with_steps(vec![
        Step::new(
            "lookup admin",
            Action::UserOp(UserOp::Lookup {
                username: admin.to_string(),
                var: "admin_exists".to_string(),
            }),
        ),
        Step::new(
            "prompt e-mail",
            Action::Prompt(
                PromptSpec::new("E-Mail for application admin user:", "admin_email")
                    .env_default(ADMIN_EMAIL_ENV),
            ),
        )
        .when(absent()),
        Step::new(
            "create admin",
            Action::UserOp(UserOp::Create {
                username: admin.to_string(),
                email: "${admin_email}".to_string(),
            }),
        )
        .when(absent()),
        Step::new(
            "prompt password",
            Action::Prompt(
                PromptSpec::new("Password for application admin user:", "admin_password")
                    .env_default(ADMIN_PASSWORD_ENV),
            ),
        )
        .when(absent()),
        Step::new(
            "prompt new password",
            Action::Prompt(PromptSpec::new(
                "Update password for application admin user (leave empty to skip):",
                "admin_password",
            )),
        )
        .when(present()),
        Step::new(
            "set password",
            Action::UserOp(UserOp::SetPassword {
                username: admin.to_string(),
                password: "${admin_password}".to_string(),
            }),
        )
        .when(When::VarSet("admin_password".to_string())),
        // Confirmation may not succeed without a short pause after creation
        Step::new("wait", Action::Wait { secs: 1 }),
        Step::new(
            "confirm admin",
            Action::UserOp(UserOp::Confirm {
                username: admin.to_string(),
            }),
        ),
    ])
}

/// Install packages for documentation rendering
fn setup_docs(settings: &Settings) -> Task {
    Task::new("setup-docs", "Install packages for documentation rendering").with_steps(vec![
        Step::new(
            "install doc packages",
            Action::Command(installer(
                settings,
                &[
                    "require",
                    "--dev",
                    "cebe/markdown-latex:dev-master",
                    "yiisoft/yii2-apidoc:2.*",
                ],
            )),
        ),
    ])
}

/// Regenerate guide and API documentation
fn generate_docs(settings: &Settings) -> Task {
    let apidoc = |args: &[&str]| {
        Action::Command(CommandSpec::new("vendor/bin/apidoc", args).timeout(settings.step_timeout()))
    };
    let areas = "backend,common,console,frontend";

    Task::new(
        "generate-docs",
        "Generate application and required vendor documentation",
    )
    .with_steps(vec![
        Step::new(
            "confirm",
            Action::Confirm {
                question: format!(
                    "Regenerate documentation files into ./{}",
                    settings.docs_output_dir
                ),
                default: true,
            },
        ),
        Step::new(
            "guide docs",
            apidoc(&[
                "guide",
                "--interactive=0",
                settings.docs_dir.as_str(),
                settings.docs_output_dir.as_str(),
            ]),
        ),
        Step::new(
            "api docs",
            apidoc(&[
                "api",
                "--interactive=0",
                "--exclude=runtime/,tests/",
                areas,
                settings.docs_output_dir.as_str(),
            ]),
        ),
        // The guide is rendered again so it picks up the API cross-links
        Step::new(
            "guide docs (final)",
            apidoc(&[
                "guide",
                "--interactive=0",
                settings.docs_dir.as_str(),
                settings.docs_output_dir.as_str(),
            ]),
        ),
    ])
}

/// Configure virtual hosts through the external helper script
fn virtual_host(settings: &Settings) -> Task {
    let helper = settings.vhost_helper.as_str();

    Task::new("virtual-host", "Setup vhosts with the virtualhost.sh helper").with_steps(vec![
        Step::new(
            "require helper",
            Action::RequireTool {
                program: helper.to_string(),
            },
        ),
        Step::new(
            "prompt frontend domain",
            Action::Prompt(
                PromptSpec::new(
                    "\"Frontend\" Domain-name (example: myproject.com.local, leave empty to skip)",
                    "frontend_domain",
                )
                .skip_rest_if_empty(),
            ),
        ),
        Step::new(
            "configure frontend vhost",
            Action::Command(
                CommandSpec::new(helper, &["${frontend_domain}"])
                    .arg(settings.web_dir("frontend"))
                    .timeout(settings.step_timeout()),
            ),
        ),
        Step::new(
            "prompt backend domain",
            Action::Prompt(
                PromptSpec::new("\"Backend\" Domain-name", "backend_domain")
                    .default_value("admin.${frontend_domain}"),
            ),
        ),
        Step::new(
            "configure backend vhost",
            Action::Command(
                CommandSpec::new(helper, &["${backend_domain}"])
                    .arg(settings.web_dir("backend"))
                    .timeout(settings.step_timeout()),
            ),
        )
        .when(When::VarSet("backend_domain".to_string())),
    ])
}
