use std::env;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = wealth_projection::api::run_http_server(port).await {
                log::error!("server error: {e}");
                std::process::exit(1);
            }
        }
        Some("project") => {
            let args = std::iter::once(raw_args[0].clone()).chain(raw_args[2..].iter().cloned());
            match wealth_projection::api::run_project_command(args) {
                Ok(report) => println!("{report}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Usage: wealth-projection serve [port]");
            eprintln!("       wealth-projection project --initial-value <VALUE> [options]");
            std::process::exit(1);
        }
    }
}
