mod parameter_store;
