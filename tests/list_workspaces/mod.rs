mod list_workspaces_test;
