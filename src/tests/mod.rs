mod test_pipeline;
