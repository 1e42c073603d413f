#[cfg(test)]
mod tests {
    use crate::cli::{BuildTarget, Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_no_subcommand_defaults_to_dev() {
        let cli = Cli::try_parse_from(["kiln"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.command(), Command::Dev(_)));
    }

    #[test]
    fn test_build_targets() {
        for (arg, target) in [
            ("scripts", BuildTarget::Scripts),
            ("styles", BuildTarget::Styles),
            ("markup", BuildTarget::Markup),
            ("images", BuildTarget::Images),
            ("all", BuildTarget::All),
        ] {
            let cli = Cli::try_parse_from(["kiln", "build", arg]).unwrap();
            match cli.command() {
                Command::Build(args) => assert_eq!(args.target, target),
                other => panic!("expected build, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_build_defaults_to_all() {
        let cli = Cli::try_parse_from(["kiln", "build"]).unwrap();
        match cli.command() {
            Command::Build(args) => {
                assert_eq!(args.target, BuildTarget::All);
                assert_eq!(args.target.pipeline_name(), None);
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_build_target_rejected() {
        assert!(Cli::try_parse_from(["kiln", "build", "fonts"]).is_err());
    }

    #[test]
    fn test_dev_overrides() {
        let cli = Cli::try_parse_from([
            "kiln",
            "dev",
            "--production",
            "--reload-port",
            "35729",
            "--server-port",
            "3000",
        ])
        .unwrap();
        let Command::Dev(args) = cli.command() else {
            panic!("expected dev command");
        };
        let overrides = &args.overrides;
        assert!(overrides.production);
        assert_eq!(overrides.reload_port, Some(35729));
        assert_eq!(overrides.server_port, Some(3000));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kiln",
            "watch",
            "--verbose",
            "--no-color",
            "--cwd",
            "site",
            "--config",
            "kiln.dev.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.cwd, Some(PathBuf::from("site")));
        assert_eq!(cli.config, Some(PathBuf::from("kiln.dev.toml")));
        assert!(matches!(cli.command(), Command::Watch(_)));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["kiln", "-v", "-q", "serve"]).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["kiln", "serve", "--server-port", "70000"]).is_err());
    }

    #[test]
    fn test_project_root_joins_relative_cwd() {
        let cli = Cli::try_parse_from(["kiln", "--cwd", "site", "serve"]).unwrap();
        let root = cli.project_root().unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("site"));
    }
}
