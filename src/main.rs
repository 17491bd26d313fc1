fn main() -> std::process::ExitCode {
    dilly_lib::run()
}
