use std::{env, fs, path::PathBuf};

fn policy_arg() -> clap::Arg {
    clap::arg!(-i --image <POLICY> "Image handling (url, save, base64)")
        .default_value("base64")
        .value_parser(["url", "u", "save", "s", "base64", "b"])
}

fn format_arg() -> clap::Arg {
    clap::arg!(-f --format <FORMAT> "Output format (markdown, text)")
        .default_value("markdown")
        .value_parser(["markdown", "md", "text", "txt"])
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("mp2md")
        .version("1.0.0")
        .author("mp2md Contributors")
        .about("Convert captured article pages to Markdown or plain text")
        .subcommand_required(true)
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").global(true).default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("url")
                .about("Fetch an article page and convert it to Markdown")
                .arg(clap::arg!(<URL> "Article URL"))
                .arg(
                    clap::arg!([OUTPUT] "Output directory or .md file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(policy_arg()),
        )
        .subcommand(
            clap::Command::new("file")
                .about("Convert a local HTML file")
                .arg(clap::arg!(<HTML> "HTML file to convert").value_parser(clap::value_parser!(std::path::PathBuf)))
                .arg(clap::arg!([OUTPUT] "Output directory or file").value_parser(clap::value_parser!(std::path::PathBuf)))
                .arg(policy_arg())
                .arg(format_arg()),
        )
        .subcommand(
            clap::Command::new("batch")
                .about("Convert every article subdirectory of a directory")
                .arg(clap::arg!(<DIR> "Directory holding one subdirectory per article"))
                .arg(policy_arg())
                .arg(format_arg()),
        )
        .subcommand(
            clap::Command::new("rename")
                .about("Normalize dated article directory names")
                .arg(clap::arg!(<DIR> "Directory holding one subdirectory per article")),
        )
        .subcommand(
            clap::Command::new("completions")
                .about("Generate a shell completion script")
                .arg(clap::arg!(<SHELL> "Target shell").value_parser(["bash", "zsh", "fish", "powershell", "elvish"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "mp2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "mp2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "mp2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "mp2md", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
