fn main() {
    if let Err(err) = patchlift::cli::run() {
        patchlift::ui::eprintln_error(&err);
        std::process::exit(patchlift::exit::exit_code(&err));
    }
}
