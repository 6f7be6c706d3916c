use std::process::ExitCode;

fn main() -> ExitCode {
    scada_admin::runtime::run_from_args()
}
