mod common;

use common::{FakeGit, Project};
use compose_agentsmd::commands::{self, InitOptions};
use speculate2::speculate;

const COMMIT: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn never(_: &str) -> bool {
    false
}

fn always(_: &str) -> bool {
    true
}

fn remote_git() -> FakeGit {
    FakeGit {
        heads: format!("{}\trefs/heads/main\n", COMMIT),
        ..FakeGit::with_files(&[("rules/global/a.md", "A")])
    }
}

speculate! {
    before {
        let project = Project::new();
    }

    describe "init" {
        it "writes a ruleset that loads back with the chosen settings" {
            let app = project.app(FakeGit::default());
            let opts = InitOptions {
                source: "./shared".to_string(),
                domains: vec!["node".to_string(), "rust".to_string()],
                claude: false,
                ..InitOptions::default()
            };

            let report = commands::init(&app, &project.ruleset_path(), &opts, &mut never)
                .expect("Failed to init");
            assert!(report.written);
            assert!(!report.overwritten);

            let ruleset = app.load_ruleset(&project.ruleset_path()).expect("Failed to load");
            assert_eq!(ruleset.source, "./shared");
            assert_eq!(ruleset.domains, vec!["node", "rust"]);
            assert!(ruleset.global);
            assert!(!ruleset.claude.enabled);
            assert_eq!(ruleset.output, "AGENTS.md");
        }

        it "defaults to the shared github rules" {
            let app = project.app(FakeGit::default());
            commands::init(&app, &project.ruleset_path(), &InitOptions::default(), &mut never).unwrap();

            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();
            assert_eq!(ruleset.source, commands::DEFAULT_SOURCE);
        }

        it "refuses to replace an existing ruleset without force" {
            let app = project.app(FakeGit::default());
            project.write("agent-ruleset.json", "{ \"source\": \"keep\" }");

            let err = commands::init(&app, &project.ruleset_path(), &InitOptions::default(), &mut always)
                .unwrap_err();
            assert!(err.to_string().contains("--force"));
            assert_eq!(project.read("agent-ruleset.json"), "{ \"source\": \"keep\" }");
        }

        it "keeps the existing ruleset when confirmation is declined" {
            let app = project.app(FakeGit::default());
            project.write("agent-ruleset.json", "{ \"source\": \"keep\" }");
            let opts = InitOptions { force: true, ..InitOptions::default() };

            let report = commands::init(&app, &project.ruleset_path(), &opts, &mut never).unwrap();
            assert!(!report.written);
            assert_eq!(project.read("agent-ruleset.json"), "{ \"source\": \"keep\" }");
        }

        it "overwrites with force and yes" {
            let app = project.app(FakeGit::default());
            project.write("agent-ruleset.json", "{ \"source\": \"keep\" }");
            let opts = InitOptions { force: true, yes: true, ..InitOptions::default() };

            let report = commands::init(&app, &project.ruleset_path(), &opts, &mut never).unwrap();
            assert!(report.overwritten);
            assert!(project.read("agent-ruleset.json").contains(commands::DEFAULT_SOURCE));
        }

        it "writes nothing on a dry run" {
            let app = project.app(FakeGit::default());
            let opts = InitOptions { dry_run: true, ..InitOptions::default() };

            let report = commands::init(&app, &project.ruleset_path(), &opts, &mut always).unwrap();
            assert!(!report.written);
            assert!(report.content.contains("\"source\""));
            assert!(!project.ruleset_path().exists());
        }
    }

    describe "edit_rules" {
        it "points local sources at their rules folder" {
            let app = project.app(FakeGit::default());
            project.write("shared/rules/global/a.md", "A");
            project.write("agent-ruleset.json", r#"{ "source": "shared" }"#);
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::edit_rules(&app, &ruleset, false).unwrap();
            assert_eq!(report.workspace, project.root.join("shared/rules"));
            assert!(!report.cloned);
        }

        it "clones github sources into the workspace on their branch" {
            let git = remote_git();
            let app = project.app(git.clone());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::edit_rules(&app, &ruleset, false).unwrap();
            assert!(report.cloned);
            assert_eq!(report.workspace, project.cache.workspace_root.join("acme/rules"));
            assert!(report.workspace.join("rules/global/a.md").is_file());

            let clones = git.calls_to("clone");
            assert_eq!(clones.len(), 1);
            assert!(!clones[0].contains(&"--depth".to_string()));
            assert_eq!(git.calls_to("checkout"), vec![vec!["checkout".to_string(), "main".to_string()]]);
        }

        it "reuses an existing workspace" {
            let git = remote_git();
            let app = project.app(git.clone());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            std::fs::create_dir_all(project.cache.workspace_root.join("acme/rules")).unwrap();
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::edit_rules(&app, &ruleset, false).unwrap();
            assert!(!report.cloned);
            assert!(git.calls().is_empty());
        }
    }

    describe "apply_rules" {
        it "fails without a workspace" {
            let app = project.app(remote_git());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let err = commands::apply_rules(&app, &ruleset, "msg", true, false, &mut always).unwrap_err();
            assert!(err.to_string().contains("edit-rules"));
        }

        it "commits and pushes pending changes then recomposes" {
            let git = FakeGit { status: " M rules/global/a.md\n".to_string(), ..remote_git() };
            let app = project.app(git.clone());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            std::fs::create_dir_all(project.cache.workspace_root.join("acme/rules")).unwrap();
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::apply_rules(&app, &ruleset, "Tighten rules", true, false, &mut never)
                .expect("Failed to apply");

            assert!(report.published);
            assert_eq!(report.pending, vec![" M rules/global/a.md"]);
            assert_eq!(git.calls_to("add").len(), 1);
            assert_eq!(
                git.calls_to("commit"),
                vec![vec!["commit".to_string(), "-m".to_string(), "Tighten rules".to_string()]]
            );
            assert_eq!(git.calls_to("push").len(), 1);
            assert!(project.read("AGENTS.md").contains("Source: github:acme/rules@main/rules/global/a.md"));
        }

        it "aborts when confirmation is declined" {
            let git = FakeGit { status: "?? rules/new.md\n".to_string(), ..remote_git() };
            let app = project.app(git.clone());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            std::fs::create_dir_all(project.cache.workspace_root.join("acme/rules")).unwrap();
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let err = commands::apply_rules(&app, &ruleset, "msg", false, false, &mut never).unwrap_err();
            assert!(err.to_string().contains("Aborted"));
            assert!(git.calls_to("push").is_empty());
            assert!(!project.exists("AGENTS.md"));
        }

        it "only reports on a dry run" {
            let git = FakeGit { status: " M rules/global/a.md\n".to_string(), ..remote_git() };
            let app = project.app(git.clone());
            project.write("agent-ruleset.json", r#"{ "source": "github:acme/rules@main" }"#);
            std::fs::create_dir_all(project.cache.workspace_root.join("acme/rules")).unwrap();
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::apply_rules(&app, &ruleset, "msg", true, true, &mut always).unwrap();
            assert!(!report.published);
            assert_eq!(report.pending.len(), 1);
            assert!(git.calls_to("commit").is_empty());
            assert!(!project.exists("AGENTS.md"));
        }

        it "recomposes local sources directly" {
            let app = project.app(FakeGit::default());
            project.write("shared/rules/global/a.md", "A");
            project.write("agent-ruleset.json", r#"{ "source": "shared" }"#);
            let ruleset = app.load_ruleset(&project.ruleset_path()).unwrap();

            let report = commands::apply_rules(&app, &ruleset, "msg", false, false, &mut never).unwrap();
            assert!(report.workspace.is_none());
            assert!(project.exists("AGENTS.md"));
        }
    }
}
