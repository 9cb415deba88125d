
mod logout_test;
mod router_test;
mod verify_code_test;
