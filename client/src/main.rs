fn main() {
    forest_client::app::bootstrap::run_client_app();
}
