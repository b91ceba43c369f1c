fn main() -> std::process::ExitCode {
    surge::entry::run()
}
