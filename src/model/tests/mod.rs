mod cnn_mnist;
