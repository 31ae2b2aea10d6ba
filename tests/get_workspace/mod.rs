mod get_workspace_test;
