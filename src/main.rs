fn main() {
    sciname::cli::run();
}
