mod monitor_test;
mod sqlite_test;
