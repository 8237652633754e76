use std::process::ExitCode;

fn main() -> ExitCode {
    social_downloader_lib::run()
}
