use quicknotez::ui::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    io::run()
}
