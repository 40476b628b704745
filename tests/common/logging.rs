#[allow(unused)] // used in tests
pub fn init_default_logging() {
    reconlib::util::log_util::init();
}
