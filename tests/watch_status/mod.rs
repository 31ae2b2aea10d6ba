mod watch_status_test;
